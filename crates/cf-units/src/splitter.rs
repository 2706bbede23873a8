//! Flow splitter.

use crate::common::{numbered_ports, require};
use crate::error::{UnitError, UnitResult};
use crate::traits::{PortMap, UnitModel};
use cf_core::{nearly_equal, Real, Tolerances};

/// Splits one inlet into N outlets by fixed flow fractions.
///
/// Composition, temperature, and pressure pass through unchanged; only the
/// flow is divided. Fractions must be non-negative and sum to 1.
pub struct Splitter {
    name: String,
    fractions: Vec<Real>,
    inlet_ports: Vec<String>,
    outlet_ports: Vec<String>,
}

impl Splitter {
    /// The inlet port is "in"; outlets are named "out1".."outN".
    pub fn new(name: impl Into<String>, fractions: Vec<Real>) -> UnitResult<Self> {
        if fractions.is_empty() {
            return Err(UnitError::InvalidConfig {
                what: "splitter needs at least one outlet fraction",
            });
        }
        if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(UnitError::InvalidConfig {
                what: "split fractions must be finite and non-negative",
            });
        }
        let sum: Real = fractions.iter().sum();
        if !nearly_equal(sum, 1.0, Tolerances { abs: 1e-9, rel: 1e-9 }) {
            return Err(UnitError::InvalidConfig {
                what: "split fractions must sum to 1",
            });
        }
        let n = fractions.len();
        Ok(Self {
            name: name.into(),
            fractions,
            inlet_ports: vec!["in".to_string()],
            outlet_ports: numbered_ports("out", n),
        })
    }
}

impl UnitModel for Splitter {
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

        let mut out = PortMap::new();
        for (port, frac) in self.outlet_ports.iter().zip(&self.fractions) {
            let mut s = inlet.clone();
            s.flow = inlet.flow * frac;
            out.insert(port.clone(), s);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{k, pa};
    use cf_props::{Composition, Stream};

    #[test]
    fn splits_flow_conservatively() {
        let splitter = Splitter::new("S1", vec![0.7, 0.3]).unwrap();
        let mut inlets = PortMap::new();
        inlets.insert(
            "in".to_string(),
            Stream::new(2.0, k(300.0), pa(1e5), Composition::pure("A")),
        );

        let out = splitter.solve(&inlets).unwrap();
        assert!((out["out1"].flow - 1.4).abs() < 1e-12);
        assert!((out["out2"].flow - 0.6).abs() < 1e-12);
        // Intensive state passes through.
        assert_eq!(out["out1"].composition, out["out2"].composition);
        assert_eq!(out["out1"].temperature, out["out2"].temperature);
    }

    #[test]
    fn fractions_must_sum_to_one() {
        assert!(Splitter::new("S1", vec![0.5, 0.4]).is_err());
        assert!(Splitter::new("S1", vec![0.5, -0.5, 1.0]).is_err());
        assert!(Splitter::new("S1", vec![]).is_err());
    }
}
