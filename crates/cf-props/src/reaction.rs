//! Reaction rate models.

use crate::composition::Composition;
use crate::error::{PropertyError, PropertyResult};
use cf_core::units::constants::R_J_PER_MOL_K;
use cf_core::{Real, Temperature};

/// Trait for chemical reaction models consumed by reactor units.
///
/// Stoichiometric coefficients are negative for reactants, positive for
/// products. Rates are intensive; the reactor decides what to do with them.
pub trait ReactionModel: Send + Sync {
    /// Reaction name (for diagnostics).
    fn name(&self) -> &str;

    /// Stoichiometric coefficients per component (negative = consumed).
    fn stoichiometry(&self) -> &[(String, Real)];

    /// Reaction rate at the given composition and temperature.
    fn rate(&self, comp: &Composition, t: Temperature) -> PropertyResult<Real>;

    /// The limiting reactant: the component with the most negative
    /// coefficient, ties broken by name order.
    fn key_reactant(&self) -> Option<&str> {
        self.stoichiometry()
            .iter()
            .filter(|(_, nu)| *nu < 0.0)
            .min_by(|(na, a), (nb, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal).then(na.cmp(nb)))
            .map(|(n, _)| n.as_str())
    }
}

/// Power-law rate expression with an Arrhenius rate constant:
/// `rate = A·exp(−Ea/(R·T)) · Π x_i^order_i`.
pub struct PowerLawReaction {
    name: String,
    stoichiometry: Vec<(String, Real)>,
    /// Reactant reaction orders (component name, order).
    orders: Vec<(String, Real)>,
    /// Pre-exponential factor A.
    pre_exponential: Real,
    /// Activation energy Ea [J/mol].
    activation_energy: Real,
}

impl PowerLawReaction {
    pub fn new(
        name: impl Into<String>,
        stoichiometry: Vec<(String, Real)>,
        orders: Vec<(String, Real)>,
        pre_exponential: Real,
        activation_energy: Real,
    ) -> PropertyResult<Self> {
        if stoichiometry.is_empty() {
            return Err(PropertyError::InvalidArg {
                what: "reaction needs stoichiometry",
            });
        }
        if !stoichiometry.iter().any(|(_, nu)| *nu < 0.0) {
            return Err(PropertyError::InvalidArg {
                what: "reaction needs at least one reactant",
            });
        }
        Ok(Self {
            name: name.into(),
            stoichiometry,
            orders,
            pre_exponential,
            activation_energy,
        })
    }

    /// Temperature-independent rate constant (Ea = 0). Convenient for tests
    /// and for isothermal design cases.
    pub fn with_rate_constant(
        name: impl Into<String>,
        stoichiometry: Vec<(String, Real)>,
        orders: Vec<(String, Real)>,
        rate_constant: Real,
    ) -> PropertyResult<Self> {
        Self::new(name, stoichiometry, orders, rate_constant, 0.0)
    }

    fn rate_constant(&self, t: Temperature) -> Real {
        self.pre_exponential * (-self.activation_energy / (R_J_PER_MOL_K * t.value)).exp()
    }
}

impl ReactionModel for PowerLawReaction {
    fn name(&self) -> &str {
        &self.name
    }

    fn stoichiometry(&self) -> &[(String, Real)] {
        &self.stoichiometry
    }

    fn rate(&self, comp: &Composition, t: Temperature) -> PropertyResult<Real> {
        let mut rate = self.rate_constant(t);
        for (name, order) in &self.orders {
            if !comp.contains(name) {
                return Err(PropertyError::UnknownComponent { name: name.clone() });
            }
            rate *= comp.fraction(name).powf(*order);
        }
        if !rate.is_finite() {
            return Err(PropertyError::NonPhysical {
                what: "reaction rate is non-finite",
            });
        }
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::k;

    fn a_to_b(k_const: Real) -> PowerLawReaction {
        PowerLawReaction::with_rate_constant(
            "A_to_B",
            vec![("A".to_string(), -1.0), ("B".to_string(), 1.0)],
            vec![("A".to_string(), 1.0)],
            k_const,
        )
        .unwrap()
    }

    fn comp(a: Real, b: Real) -> Composition {
        Composition::from_fractions(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap()
    }

    #[test]
    fn first_order_rate() {
        let rxn = a_to_b(0.1);
        let r = rxn.rate(&comp(0.5, 0.5), k(350.0)).unwrap();
        assert!((r - 0.05).abs() < 1e-12);
    }

    #[test]
    fn arrhenius_rate_increases_with_temperature() {
        let rxn = PowerLawReaction::new(
            "A_to_B",
            vec![("A".to_string(), -1.0), ("B".to_string(), 1.0)],
            vec![("A".to_string(), 1.0)],
            1e10,
            7e4,
        )
        .unwrap();
        let cold = rxn.rate(&comp(0.5, 0.5), k(300.0)).unwrap();
        let hot = rxn.rate(&comp(0.5, 0.5), k(400.0)).unwrap();
        assert!(hot > cold);
    }

    #[test]
    fn key_reactant_is_most_negative() {
        let rxn = PowerLawReaction::with_rate_constant(
            "combustion",
            vec![
                ("Fuel".to_string(), -1.0),
                ("O2".to_string(), -3.0),
                ("CO2".to_string(), 2.0),
            ],
            vec![],
            1.0,
        )
        .unwrap();
        assert_eq!(rxn.key_reactant(), Some("O2"));
    }

    #[test]
    fn missing_order_component_is_reported() {
        let rxn = PowerLawReaction::with_rate_constant(
            "A_to_B",
            vec![("A".to_string(), -1.0), ("B".to_string(), 1.0)],
            vec![("C".to_string(), 1.0)],
            1.0,
        )
        .unwrap();
        let err = rxn.rate(&comp(0.5, 0.5), k(350.0)).unwrap_err();
        assert!(matches!(err, PropertyError::UnknownComponent { .. }));
    }

    #[test]
    fn reaction_without_reactants_is_rejected() {
        let result = PowerLawReaction::with_rate_constant(
            "bogus",
            vec![("B".to_string(), 1.0)],
            vec![],
            1.0,
        );
        assert!(result.is_err());
    }
}
