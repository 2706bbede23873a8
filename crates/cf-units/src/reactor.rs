//! Reactor models.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::{composition_from_flows, require, species_flows, MAX_INTERNAL_ITERS};
use crate::error::{UnitError, UnitResult};
use crate::traits::{PortMap, UnitModel};
use cf_core::{Real, Volume};
use cf_props::{PropertyPackage, ReactionModel, Stream};

/// Reactor with a specified fractional conversion of the key reactant.
///
/// Outlet component flows follow directly from the reaction stoichiometry:
/// `extent = conversion · F_key / |ν_key|`, `F_i_out = F_i_in + ν_i · extent`.
/// Isothermal and isobaric; total flow changes only as the stoichiometry
/// dictates (for 1:1 reactions it is conserved exactly).
pub struct FixedConversionReactor {
    name: String,
    conversion: Real,
    reaction: Arc<dyn ReactionModel>,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
}

impl FixedConversionReactor {
    pub fn new(
        name: impl Into<String>,
        conversion: Real,
        reaction: Arc<dyn ReactionModel>,
    ) -> UnitResult<Self> {
        if !(0.0..=1.0).contains(&conversion) || !conversion.is_finite() {
            return Err(UnitError::InvalidConfig {
                what: "conversion must lie in [0, 1]",
            });
        }
        if reaction.key_reactant().is_none() {
            return Err(UnitError::InvalidConfig {
                what: "reaction has no reactant to convert",
            });
        }
        Ok(Self {
            name: name.into(),
            conversion,
            reaction,
            inlet_ports: vec!["in".to_string()],
            outlet_ports: vec!["out".to_string()],
        })
    }
}

impl UnitModel for FixedConversionReactor {
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

        let key = self
            .reaction
            .key_reactant()
            .ok_or(UnitError::InvalidConfig {
                what: "reaction has no reactant to convert",
            })?;
        let nu_key = self
            .reaction
            .stoichiometry()
            .iter()
            .find(|(n, _)| n == key)
            .map(|(_, nu)| *nu)
            .unwrap_or(-1.0);

        let mut flows = species_flows([inlet]);
        let extent = self.conversion * inlet.component_flow(key) / nu_key.abs();

        for (name, nu) in self.reaction.stoichiometry() {
            let entry = flows.entry(name.clone()).or_insert(0.0);
            *entry += nu * extent;
            if *entry < -1e-12 {
                return Err(UnitError::NonPhysical {
                    unit: self.name.clone(),
                    what: "conversion drives a component flow negative",
                });
            }
            *entry = entry.max(0.0);
        }

        let (total, comp) = composition_from_flows(&self.name, &flows)?;
        let mut out = PortMap::new();
        out.insert(
            "out".to_string(),
            Stream::new(total, inlet.temperature, inlet.pressure, comp),
        );
        Ok(out)
    }
}

/// Continuous stirred-tank reactor with kinetic rate closure.
///
/// The outlet composition satisfies the steady-state mass balance
/// `x_key,in − x_key,out = τ · rate(x_out, T)`, solved by damped fixed-point
/// iteration on the key reactant with stoichiometric updates for the rest.
/// Isothermal; residence time comes from the reactor volume and the
/// volumetric flow given by the property package.
pub struct Cstr {
    name: String,
    volume: Volume,
    reaction: Arc<dyn ReactionModel>,
    prop: Arc<dyn PropertyPackage>,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
}

impl Cstr {
    pub fn new(
        name: impl Into<String>,
        volume: Volume,
        reaction: Arc<dyn ReactionModel>,
        prop: Arc<dyn PropertyPackage>,
    ) -> UnitResult<Self> {
        if volume.value <= 0.0 || !volume.value.is_finite() {
            return Err(UnitError::InvalidConfig {
                what: "reactor volume must be positive",
            });
        }
        if reaction.key_reactant().is_none() {
            return Err(UnitError::InvalidConfig {
                what: "reaction has no reactant to convert",
            });
        }
        Ok(Self {
            name: name.into(),
            volume,
            reaction,
            prop,
            inlet_ports: vec!["in".to_string()],
            outlet_ports: vec!["out".to_string()],
        })
    }
}

impl UnitModel for Cstr {
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

        if inlet.flow <= 0.0 {
            // Nothing to react; pass the (empty) stream through.
            let mut out = PortMap::new();
            out.insert("out".to_string(), inlet.clone());
            return Ok(out);
        }

        let key = self
            .reaction
            .key_reactant()
            .ok_or(UnitError::InvalidConfig {
                what: "reaction has no reactant to convert",
            })?;
        let nu_key = self
            .reaction
            .stoichiometry()
            .iter()
            .find(|(n, _)| n == key)
            .map(|(_, nu)| *nu)
            .unwrap_or(-1.0);

        // Residence time from volumetric throughput.
        let rho_molar = self
            .prop
            .molar_density(inlet.temperature, inlet.pressure, &inlet.composition)
            .map_err(|e| UnitError::from_property(&self.name, e))?;
        if rho_molar <= 0.0 {
            return Err(UnitError::NonPhysical {
                unit: self.name.clone(),
                what: "molar density must be positive",
            });
        }
        let tau = self.volume.value * rho_molar / inlet.flow;

        let x_key_in = inlet.composition.fraction(key);
        let mut fractions: BTreeMap<String, Real> = inlet
            .composition
            .iter()
            .map(|(n, f)| (n.to_string(), f))
            .collect();
        for (name, _) in self.reaction.stoichiometry() {
            fractions.entry(name.clone()).or_insert(0.0);
        }

        // Fixed-point iteration on the key reactant fraction.
        let mut x_key = x_key_in;
        let mut converged = false;
        for _ in 0..MAX_INTERNAL_ITERS {
            let comp = cf_props::Composition::from_fractions(
                fractions.iter().map(|(n, f)| (n.clone(), *f)),
            )
            .map_err(|e| UnitError::from_property(&self.name, e))?;
            let rate = self
                .reaction
                .rate(&comp, inlet.temperature)
                .map_err(|e| UnitError::from_property(&self.name, e))?;

            let x_sub = x_key_in / (1.0 + tau * rate / x_key_in.max(1e-12));
            // Average with the previous iterate: the raw substitution map
            // oscillates for large Damköhler numbers.
            let x_new = (0.5 * (x_key + x_sub)).clamp(0.0, x_key_in);

            let delta = (x_key_in - x_new) / nu_key.abs();
            for (name, nu) in self.reaction.stoichiometry() {
                let base = inlet.composition.fraction(name);
                let updated = if name == key {
                    x_new
                } else {
                    (base + nu * delta).max(0.0)
                };
                fractions.insert(name.clone(), updated);
            }

            if (x_new - x_key).abs() < 1e-10 {
                x_key = x_new;
                converged = true;
                break;
            }
            x_key = x_new;
        }

        if !converged {
            return Err(UnitError::Convergence {
                unit: self.name.clone(),
                what: format!(
                    "kinetic balance did not settle within {MAX_INTERNAL_ITERS} iterations"
                ),
            });
        }

        let (_, comp) = composition_from_flows(&self.name, &fractions)?;
        // Mole-fraction basis: the renormalized composition carries the
        // stoichiometric shift, total flow is conserved.
        let mut out = PortMap::new();
        out.insert(
            "out".to_string(),
            Stream::new(inlet.flow, inlet.temperature, inlet.pressure, comp),
        );
        Ok(out)
    }
}
