//! Property package contract and the ideal-correlation backend.

use crate::component::ChemComponent;
use crate::composition::Composition;
use crate::error::{PropertyError, PropertyResult};
use cf_core::units::constants::{R_J_PER_MOL_K, T_REF_K};
use cf_core::{Pressure, Real, Temperature};

/// Trait for thermodynamic property backends.
///
/// Implementations must be thread-safe (Send + Sync) so independent solves
/// can share one package. Unit operations call these methods; the convergence
/// engine never does. Rigorous backends (equations of state, flash packages)
/// plug in behind the same contract.
pub trait PropertyPackage: Send + Sync {
    /// Get the package name (for debugging/logging).
    fn name(&self) -> &str;

    /// Components this package can evaluate.
    fn components(&self) -> &[ChemComponent];

    /// Whether the package knows every component in the composition.
    fn supports(&self, comp: &Composition) -> bool {
        comp.names().all(|n| self.component(n).is_some())
    }

    /// Look up a component definition by name.
    fn component(&self, name: &str) -> Option<&ChemComponent> {
        self.components().iter().find(|c| c.name == name)
    }

    /// Mixture molar mass [kg/kmol].
    fn molar_mass(&self, comp: &Composition) -> PropertyResult<Real>;

    /// Molar density [mol/m³] at the given state.
    fn molar_density(
        &self,
        t: Temperature,
        p: Pressure,
        comp: &Composition,
    ) -> PropertyResult<Real>;

    /// Mass density [kg/m³] at the given state.
    fn density(&self, t: Temperature, p: Pressure, comp: &Composition) -> PropertyResult<Real> {
        let rho_molar = self.molar_density(t, p, comp)?;
        // molar_mass is kg/kmol == g/mol; convert to kg/mol
        Ok(rho_molar * self.molar_mass(comp)? / 1000.0)
    }

    /// Mixture molar enthalpy [J/mol] at the given state.
    fn enthalpy(&self, t: Temperature, p: Pressure, comp: &Composition) -> PropertyResult<Real>;

    /// Vapor-liquid equilibrium K-value for one component.
    ///
    /// Default implementation returns NotSupported; only backends with phase
    /// equilibrium data implement this.
    fn k_value(&self, _name: &str, _t: Temperature, _p: Pressure) -> PropertyResult<Real> {
        Err(PropertyError::NotSupported {
            what: "k_value not implemented for this property package",
        })
    }
}

/// Ideal-mixture property package.
///
/// Density from the ideal gas law, enthalpy from constant component heat
/// capacities against a common reference temperature. Good enough for the
/// balance equations the unit operations solve; anything more rigorous
/// belongs in an external backend.
#[derive(Debug, Clone)]
pub struct IdealPropertyPackage {
    components: Vec<ChemComponent>,
}

impl IdealPropertyPackage {
    pub fn new(components: Vec<ChemComponent>) -> PropertyResult<Self> {
        if components.is_empty() {
            return Err(PropertyError::InvalidArg {
                what: "property package needs at least one component",
            });
        }
        for c in &components {
            if c.molar_mass <= 0.0 || !c.molar_mass.is_finite() {
                return Err(PropertyError::NonPhysical {
                    what: "component molar mass must be positive and finite",
                });
            }
            if c.cp_molar <= 0.0 || !c.cp_molar.is_finite() {
                return Err(PropertyError::NonPhysical {
                    what: "component heat capacity must be positive and finite",
                });
            }
        }
        Ok(Self { components })
    }

    fn require_known(&self, comp: &Composition) -> PropertyResult<()> {
        for name in comp.names() {
            if self.component(name).is_none() {
                return Err(PropertyError::UnknownComponent {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PropertyPackage for IdealPropertyPackage {
    fn name(&self) -> &str {
        "ideal"
    }

    fn components(&self) -> &[ChemComponent] {
        &self.components
    }

    fn molar_mass(&self, comp: &Composition) -> PropertyResult<Real> {
        self.require_known(comp)?;
        let mut m = 0.0;
        for (name, frac) in comp.iter() {
            // require_known guarantees the lookup succeeds
            if let Some(c) = self.component(name) {
                m += frac * c.molar_mass;
            }
        }
        Ok(m)
    }

    fn molar_density(
        &self,
        t: Temperature,
        p: Pressure,
        comp: &Composition,
    ) -> PropertyResult<Real> {
        self.require_known(comp)?;
        let t_k = t.value;
        if t_k <= 0.0 || !t_k.is_finite() {
            return Err(PropertyError::NonPhysical {
                what: "temperature must be positive for density",
            });
        }
        Ok(p.value / (R_J_PER_MOL_K * t_k))
    }

    fn enthalpy(&self, t: Temperature, _p: Pressure, comp: &Composition) -> PropertyResult<Real> {
        self.require_known(comp)?;
        let dt = t.value - T_REF_K;
        let mut h = 0.0;
        for (name, frac) in comp.iter() {
            if let Some(c) = self.component(name) {
                h += frac * c.cp_molar * dt;
            }
        }
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{k, pa};

    fn pkg() -> IdealPropertyPackage {
        IdealPropertyPackage::new(vec![
            ChemComponent::new("Water", "H2O", 18.015, 75.3),
            ChemComponent::new("Ethanol", "C2H6O", 46.07, 112.3),
        ])
        .unwrap()
    }

    fn half_half() -> Composition {
        Composition::from_fractions(vec![
            ("Water".to_string(), 0.5),
            ("Ethanol".to_string(), 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn molar_mass_is_mole_weighted() {
        let m = pkg().molar_mass(&half_half()).unwrap();
        assert!((m - (18.015 + 46.07) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn ideal_gas_molar_density() {
        let rho = pkg()
            .molar_density(k(298.15), pa(101_325.0), &half_half())
            .unwrap();
        // ~40.87 mol/m³ at ambient conditions
        assert!((rho - 101_325.0 / (R_J_PER_MOL_K * 298.15)).abs() < 1e-9);
    }

    #[test]
    fn enthalpy_zero_at_reference() {
        let h = pkg()
            .enthalpy(k(T_REF_K), pa(101_325.0), &half_half())
            .unwrap();
        assert!(h.abs() < 1e-9);
    }

    #[test]
    fn enthalpy_monotone_in_temperature() {
        let p = pkg();
        let comp = half_half();
        let h1 = p.enthalpy(k(300.0), pa(101_325.0), &comp).unwrap();
        let h2 = p.enthalpy(k(350.0), pa(101_325.0), &comp).unwrap();
        assert!(h2 > h1);
    }

    #[test]
    fn unknown_component_is_reported() {
        let comp = Composition::pure("Benzene");
        let err = pkg().molar_mass(&comp).unwrap_err();
        assert!(matches!(err, PropertyError::UnknownComponent { .. }));
    }

    #[test]
    fn k_value_not_supported_by_default() {
        let err = pkg().k_value("Water", k(350.0), pa(101_325.0)).unwrap_err();
        assert!(matches!(err, PropertyError::NotSupported { .. }));
    }
}
