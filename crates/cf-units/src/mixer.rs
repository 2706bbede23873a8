//! Adiabatic stream mixer.

use std::sync::Arc;

use crate::common::{
    composition_from_flows, numbered_ports, require, species_flows, solve_temperature_for_enthalpy,
};
use crate::error::{UnitError, UnitResult};
use crate::traits::{PortMap, UnitModel};
use cf_core::{k, Real};
use cf_props::{PropertyPackage, Stream};

/// Mixes N inlet streams into one outlet.
///
/// Total flow and component flows are summed; outlet pressure is the lowest
/// inlet pressure; outlet temperature closes the adiabatic enthalpy balance,
/// solved by bisection against the property package. Zero-flow inlets (a
/// recycle stream at startup) contribute nothing to the balance.
pub struct Mixer {
    name: String,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
    prop: Arc<dyn PropertyPackage>,
}

impl Mixer {
    /// Inlet ports are named "in1".."inN"; the outlet is "out".
    pub fn new(
        name: impl Into<String>,
        n_inlets: usize,
        prop: Arc<dyn PropertyPackage>,
    ) -> UnitResult<Self> {
        if n_inlets < 1 {
            return Err(UnitError::InvalidConfig {
                what: "mixer needs at least one inlet",
            });
        }
        Ok(Self {
            name: name.into(),
            inlet_ports: numbered_ports("in", n_inlets),
            outlet_ports: vec!["out".to_string()],
            prop,
        })
    }
}

impl UnitModel for Mixer {
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
        let mut streams = Vec::with_capacity(self.inlet_ports.len());
        for port in &self.inlet_ports {
            streams.push(require(inlets, &self.name, port)?);
        }

        let flows = species_flows(streams.iter().copied());
        let (total, comp) = composition_from_flows(&self.name, &flows)?;

        let p_out = streams
            .iter()
            .map(|s| s.pressure)
            .fold(streams[0].pressure, |a, b| if b < a { b } else { a });

        if total <= 0.0 {
            // Nothing flowing yet; report the coldest-possible consistent state.
            let t_out = streams[0].temperature;
            let mut out = PortMap::new();
            out.insert("out".to_string(), Stream::new(0.0, t_out, p_out, comp));
            return Ok(out);
        }

        // Adiabatic balance: total enthalpy in = total enthalpy out.
        let mut h_total: Real = 0.0;
        let mut t_lo = streams[0].temperature.value;
        let mut t_hi = t_lo;
        for s in &streams {
            if s.flow <= 0.0 {
                continue;
            }
            let h = self
                .prop
                .enthalpy(s.temperature, s.pressure, &s.composition)
                .map_err(|e| UnitError::from_property(&self.name, e))?;
            h_total += s.flow * h;
            t_lo = t_lo.min(s.temperature.value);
            t_hi = t_hi.max(s.temperature.value);
        }
        let h_target = h_total / total;

        let t_out = solve_temperature_for_enthalpy(
            &self.name,
            self.prop.as_ref(),
            &comp,
            p_out,
            h_target,
            k(t_lo),
            k(t_hi),
        )?;

        let mut out = PortMap::new();
        out.insert(
            "out".to_string(),
            Stream::new(total, t_out, p_out, comp).with_enthalpy(h_target),
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::pa;
    use cf_props::{ChemComponent, Composition, IdealPropertyPackage};

    fn pkg() -> Arc<dyn PropertyPackage> {
        Arc::new(
            IdealPropertyPackage::new(vec![
                ChemComponent::new("A", "A", 30.0, 100.0),
                ChemComponent::new("B", "B", 50.0, 100.0),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn mixes_flows_and_compositions() {
        let mixer = Mixer::new("M1", 2, pkg()).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in1".to_string(),
            Stream::new(2.0, k(300.0), pa(2e5), Composition::pure("A")),
        );
        inlets.insert(
            "in2".to_string(),
            Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("B")),
        );

        let out = mixer.solve(&inlets).unwrap();
        let s = &out["out"];
        assert!((s.flow - 3.0).abs() < 1e-12);
        assert!((s.composition.fraction("A") - 2.0 / 3.0).abs() < 1e-12);
        // Lowest inlet pressure wins.
        assert!((s.pressure.value - 1e5).abs() < 1e-9);
    }

    #[test]
    fn equal_cp_temperature_is_flow_weighted() {
        let mixer = Mixer::new("M1", 2, pkg()).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in1".to_string(),
            Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("A")),
        );
        inlets.insert(
            "in2".to_string(),
            Stream::new(3.0, k(400.0), pa(1e5), Composition::pure("A")),
        );

        let out = mixer.solve(&inlets).unwrap();
        // Same cp everywhere: T_out = (1*300 + 3*400)/4 = 375.
        assert!((out["out"].temperature.value - 375.0).abs() < 1e-6);
    }

    #[test]
    fn zero_flow_inlet_is_ignored() {
        let mixer = Mixer::new("M1", 2, pkg()).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in1".to_string(),
            Stream::new(1.0, k(350.0), pa(1e5), Composition::pure("A")),
        );
        inlets.insert(
            "in2".to_string(),
            Stream::new(0.0, k(500.0), pa(1e5), Composition::pure("B")),
        );

        let out = mixer.solve(&inlets).unwrap();
        let s = &out["out"];
        assert!((s.flow - 1.0).abs() < 1e-12);
        assert!((s.temperature.value - 350.0).abs() < 1e-6);
        assert!((s.composition.fraction("A") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_inlets_give_zero_outlet() {
        let mixer = Mixer::new("M1", 2, pkg()).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in1".to_string(),
            Stream::new(0.0, k(300.0), pa(1e5), Composition::pure("A")),
        );
        inlets.insert(
            "in2".to_string(),
            Stream::new(0.0, k(300.0), pa(1e5), Composition::pure("B")),
        );

        let out = mixer.solve(&inlets).unwrap();
        assert_eq!(out["out"].flow, 0.0);
    }

    #[test]
    fn missing_inlet_is_reported() {
        let mixer = Mixer::new("M1", 2, pkg()).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in1".to_string(),
            Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("A")),
        );
        let err = mixer.solve(&inlets).unwrap_err();
        assert!(matches!(err, UnitError::MissingInlet { .. }));
    }
}
