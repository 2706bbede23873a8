//! Single-stream heater/cooler.

use std::sync::Arc;

use crate::common::{require, solve_temperature_for_enthalpy};
use crate::error::{UnitError, UnitResult};
use crate::traits::{PortMap, UnitModel};
use cf_core::{Real, Temperature};
use cf_props::{PropertyPackage, Stream};

/// What the exchanger holds fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HxSpec {
    /// Outlet temperature in K; the duty follows from the enthalpy change.
    OutletTemperature(Temperature),
    /// Heat duty in W (positive heats the stream); the outlet temperature
    /// follows from the enthalpy balance.
    Duty(Real),
}

/// Heats or cools one stream against an unmodelled utility.
///
/// Flow, composition, and pressure pass through unchanged. With a
/// temperature spec the outlet state is explicit; with a duty spec the
/// outlet temperature is found by inverting the enthalpy curve.
pub struct HeatExchanger {
    name: String,
    spec: HxSpec,
    prop: Arc<dyn PropertyPackage>,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
}

impl HeatExchanger {
    pub fn new(
        name: impl Into<String>,
        spec: HxSpec,
        prop: Arc<dyn PropertyPackage>,
    ) -> UnitResult<Self> {
        match spec {
            HxSpec::OutletTemperature(t) if !(t.value.is_finite() && t.value > 0.0) => {
                return Err(UnitError::InvalidConfig {
                    what: "outlet temperature must be positive",
                });
            }
            HxSpec::Duty(q) if !q.is_finite() => {
                return Err(UnitError::InvalidConfig {
                    what: "duty must be finite",
                });
            }
            _ => {}
        }
        Ok(Self {
            name: name.into(),
            spec,
            prop,
            inlet_ports: vec!["in".to_string()],
            outlet_ports: vec!["out".to_string()],
        })
    }
}

impl UnitModel for HeatExchanger {
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

        let mut outlet = inlet.clone();
        match self.spec {
            HxSpec::OutletTemperature(t_out) => {
                outlet.temperature = t_out;
                let h = self
                    .prop
                    .enthalpy(t_out, outlet.pressure, &outlet.composition)
                    .map_err(|e| UnitError::from_property(&self.name, e))?;
                outlet.enthalpy = Some(h);
            }
            HxSpec::Duty(duty) => {
                if inlet.flow <= 0.0 {
                    // No carrier for the duty; leave the stream untouched.
                    let mut out = PortMap::new();
                    out.insert("out".to_string(), outlet);
                    return Ok(out);
                }
                let h_in = self
                    .prop
                    .enthalpy(inlet.temperature, inlet.pressure, &inlet.composition)
                    .map_err(|e| UnitError::from_property(&self.name, e))?;
                let h_target = h_in + duty / inlet.flow;
                let t_out = solve_temperature_for_enthalpy(
                    &self.name,
                    self.prop.as_ref(),
                    &outlet.composition,
                    outlet.pressure,
                    h_target,
                    inlet.temperature,
                    inlet.temperature,
                )?;
                outlet.temperature = t_out;
                outlet.enthalpy = Some(h_target);
            }
        }

        let mut out = PortMap::new();
        out.insert("out".to_string(), outlet);
        Ok(out)
    }
}
