//! Material stream snapshots.

use crate::composition::Composition;
use crate::error::{PropertyError, PropertyResult};
use cf_core::{Pressure, Real, Temperature};

/// One material stream state: total flow, composition, temperature, pressure.
///
/// Streams are immutable value snapshots: the solver replaces the registry
/// entry wholesale on every pass rather than mutating in place. Flow is
/// basis-agnostic (mass or mole, as long as the whole flowsheet agrees).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stream {
    /// Total flow rate (mass or mole basis).
    pub flow: Real,
    pub temperature: Temperature,
    pub pressure: Pressure,
    pub composition: Composition,
    /// Molar/specific enthalpy, when a unit has computed it [J/mol].
    pub enthalpy: Option<Real>,
}

impl Stream {
    pub fn new(
        flow: Real,
        temperature: Temperature,
        pressure: Pressure,
        composition: Composition,
    ) -> Self {
        Self {
            flow,
            temperature,
            pressure,
            composition,
            enthalpy: None,
        }
    }

    pub fn with_enthalpy(mut self, enthalpy: Real) -> Self {
        self.enthalpy = Some(enthalpy);
        self
    }

    /// Flow carried by a single component.
    pub fn component_flow(&self, name: &str) -> Real {
        self.flow * self.composition.fraction(name)
    }

    /// Validate the stream invariants: finite non-negative flow, finite T/P,
    /// normalized composition.
    pub fn validate(&self) -> PropertyResult<()> {
        if !self.flow.is_finite() || self.flow < 0.0 {
            return Err(PropertyError::NonPhysical {
                what: "stream flow must be finite and non-negative",
            });
        }
        if !self.temperature.value.is_finite() || self.temperature.value <= 0.0 {
            return Err(PropertyError::NonPhysical {
                what: "stream temperature must be finite and positive",
            });
        }
        if !self.pressure.value.is_finite() || self.pressure.value < 0.0 {
            return Err(PropertyError::NonPhysical {
                what: "stream pressure must be finite and non-negative",
            });
        }
        if !self.composition.is_normalized(Default::default()) {
            return Err(PropertyError::NonPhysical {
                what: "stream composition does not sum to 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{k, pa};

    fn feed() -> Stream {
        Stream::new(
            0.1,
            k(353.0),
            pa(101_325.0),
            Composition::from_fractions(vec![
                ("A".to_string(), 0.8),
                ("B".to_string(), 0.2),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn component_flow_splits_total() {
        let s = feed();
        assert!((s.component_flow("A") - 0.08).abs() < 1e-12);
        assert!((s.component_flow("B") - 0.02).abs() < 1e-12);
        assert_eq!(s.component_flow("C"), 0.0);
    }

    #[test]
    fn validate_accepts_feed() {
        assert!(feed().validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_flow() {
        let mut s = feed();
        s.flow = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_nan_temperature() {
        let mut s = feed();
        s.temperature = k(f64::NAN);
        assert!(s.validate().is_err());
    }
}
