//! Component separator.

use std::collections::BTreeMap;

use crate::common::{composition_from_flows, require, species_flows};
use crate::error::{UnitError, UnitResult};
use crate::traits::{PortMap, UnitModel};
use cf_core::Real;
use cf_props::Stream;

/// Splits an inlet by per-component recovery fractions.
///
/// Each component is routed to the "overhead" outlet according to its
/// recovery fraction; the remainder leaves through "bottoms". Components not
/// listed default to bottoms. Temperature and pressure pass through to both
/// outlets; total mass is conserved exactly.
pub struct Separator {
    name: String,
    /// Fraction of each component reporting to overhead.
    overhead_recovery: Vec<(String, Real)>,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
}

impl Separator {
    pub fn new(
        name: impl Into<String>,
        overhead_recovery: Vec<(String, Real)>,
    ) -> UnitResult<Self> {
        for (_, frac) in &overhead_recovery {
            if !frac.is_finite() || *frac < 0.0 || *frac > 1.0 {
                return Err(UnitError::InvalidConfig {
                    what: "component recovery fractions must lie in [0, 1]",
                });
            }
        }
        Ok(Self {
            name: name.into(),
            overhead_recovery,
            inlet_ports: vec!["in".to_string()],
            outlet_ports: vec!["overhead".to_string(), "bottoms".to_string()],
        })
    }

    fn recovery(&self, component: &str) -> Real {
        self.overhead_recovery
            .iter()
            .find(|(n, _)| n == component)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }
}

impl UnitModel for Separator {
    fn name(&self) -> &str {
        &self.name
    }

    fn inlet_ports(&self) -> &[String] {
        &self.inlet_ports
    }

    fn outlet_ports(&self) -> &[String] {
        &self.outlet_ports
    }

    fn solve(&self, inlets: &PortMap) -> UnitResult<PortMap> {
        let inlet = require(inlets, &self.name, "in")?;
        let inlet_flows = species_flows([inlet]);

        let mut top: BTreeMap<String, Real> = BTreeMap::new();
        let mut bottom: BTreeMap<String, Real> = BTreeMap::new();
        for (name, flow) in &inlet_flows {
            let r = self.recovery(name);
            top.insert(name.clone(), flow * r);
            bottom.insert(name.clone(), flow * (1.0 - r));
        }

        let (top_total, top_comp) = composition_from_flows(&self.name, &top)?;
        let (bot_total, bot_comp) = composition_from_flows(&self.name, &bottom)?;

        let mut out = PortMap::new();
        out.insert(
            "overhead".to_string(),
            Stream::new(top_total, inlet.temperature, inlet.pressure, top_comp),
        );
        out.insert(
            "bottoms".to_string(),
            Stream::new(bot_total, inlet.temperature, inlet.pressure, bot_comp),
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{k, pa};
    use cf_props::Composition;

    fn feed() -> Stream {
        Stream::new(
            1.0,
            k(351.0),
            pa(101_325.0),
            Composition::from_fractions(vec![
                ("Ethanol".to_string(), 0.5),
                ("Water".to_string(), 0.5),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn sharp_split_routes_components() {
        let sep = Separator::new(
            "S1",
            vec![("Ethanol".to_string(), 0.99), ("Water".to_string(), 0.01)],
        )
        .unwrap();
        let mut inlets = PortMap::new();
        inlets.insert("in".to_string(), feed());

        let out = sep.solve(&inlets).unwrap();
        let top = &out["overhead"];
        let bot = &out["bottoms"];

        // Mass balance: totals add back to the feed.
        assert!((top.flow + bot.flow - 1.0).abs() < 1e-12);
        // Overhead is ethanol-rich.
        assert!(top.composition.fraction("Ethanol") > 0.98);
        assert!(bot.composition.fraction("Water") > 0.98);
    }

    #[test]
    fn unlisted_component_goes_to_bottoms() {
        let sep = Separator::new("S1", vec![("Ethanol".to_string(), 1.0)]).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert("in".to_string(), feed());

        let out = sep.solve(&inlets).unwrap();
        assert!((out["bottoms"].component_flow("Water") - 0.5).abs() < 1e-12);
        assert!(out["bottoms"].component_flow("Ethanol").abs() < 1e-12);
    }

    #[test]
    fn invalid_recovery_rejected() {
        assert!(Separator::new("S1", vec![("A".to_string(), 1.2)]).is_err());
        assert!(Separator::new("S1", vec![("A".to_string(), -0.1)]).is_err());
    }
}
