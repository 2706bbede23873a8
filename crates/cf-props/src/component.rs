//! Chemical component definitions.

use cf_core::Real;

/// A single chemical component with the constants property correlations need.
///
/// Molar mass is stored in kg/kmol (numerically equal to g/mol). Pseudo
/// components are supported by supplying the constants directly; there is no
/// database lookup at this layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChemComponent {
    pub name: String,
    pub formula: String,
    /// Molar mass [kg/kmol]
    pub molar_mass: Real,
    /// Ideal-gas molar heat capacity [J/(mol·K)]
    pub cp_molar: Real,
}

impl ChemComponent {
    pub fn new(
        name: impl Into<String>,
        formula: impl Into<String>,
        molar_mass: Real,
        cp_molar: Real,
    ) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            molar_mass,
            cp_molar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_fields() {
        let water = ChemComponent::new("Water", "H2O", 18.015, 75.3);
        assert_eq!(water.name, "Water");
        assert_eq!(water.formula, "H2O");
        assert!((water.molar_mass - 18.015).abs() < 1e-9);
    }
}
