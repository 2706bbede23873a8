//! Shared helpers for unit-operation balance equations.

use std::collections::BTreeMap;

use crate::error::{UnitError, UnitResult};
use crate::traits::PortMap;
use cf_core::{k, Pressure, Real, Temperature};
use cf_props::{Composition, PropertyPackage, Stream};

/// Bound on the internal iterations a unit may spend on an implicit balance.
pub const MAX_INTERNAL_ITERS: usize = 64;

/// Fetch a required inlet stream by port name.
pub fn require<'a>(inlets: &'a PortMap, unit: &str, port: &str) -> UnitResult<&'a Stream> {
    inlets.get(port).ok_or_else(|| UnitError::MissingInlet {
        unit: unit.to_string(),
        port: port.to_string(),
    })
}

/// Per-component flows of a set of streams, summed, keyed by component name.
pub fn species_flows<'a>(streams: impl IntoIterator<Item = &'a Stream>) -> BTreeMap<String, Real> {
    let mut flows: BTreeMap<String, Real> = BTreeMap::new();
    for s in streams {
        for (name, frac) in s.composition.iter() {
            *flows.entry(name.to_string()).or_insert(0.0) += s.flow * frac;
        }
    }
    flows
}

/// Build a composition plus total flow from per-component flows.
///
/// A zero total is legal during recycle startup; the composition then falls
/// back to equal fractions over the listed components so the field layout
/// stays stable.
pub fn composition_from_flows(
    unit: &str,
    flows: &BTreeMap<String, Real>,
) -> UnitResult<(Real, Composition)> {
    if flows.is_empty() {
        return Err(UnitError::NonPhysical {
            unit: unit.to_string(),
            what: "no components in stream",
        });
    }
    let total: Real = flows.values().sum();
    if total < 0.0 || !total.is_finite() {
        return Err(UnitError::NonPhysical {
            unit: unit.to_string(),
            what: "total flow is negative or non-finite",
        });
    }

    let fractions: Vec<(String, Real)> = if total > 0.0 {
        flows.iter().map(|(n, f)| (n.clone(), f.max(0.0))).collect()
    } else {
        let equal = 1.0 / flows.len() as Real;
        flows.keys().map(|n| (n.clone(), equal)).collect()
    };

    let comp = Composition::from_fractions(fractions)
        .map_err(|e| UnitError::from_property(unit, e))?;
    Ok((total, comp))
}

/// Solve `h(T) = h_target` for temperature by bisection.
///
/// The initial bracket is widened a few times if it does not contain the
/// target; running out of internal iterations or bracket expansions is a
/// unit convergence failure.
pub fn solve_temperature_for_enthalpy(
    unit: &str,
    prop: &dyn PropertyPackage,
    comp: &Composition,
    p: Pressure,
    h_target: Real,
    t_guess_lo: Temperature,
    t_guess_hi: Temperature,
) -> UnitResult<Temperature> {
    let h_at = |t_k: Real| -> UnitResult<Real> {
        prop.enthalpy(k(t_k), p, comp)
            .map_err(|e| UnitError::from_property(unit, e))
    };

    let mut lo = t_guess_lo.value.min(t_guess_hi.value);
    let mut hi = t_guess_lo.value.max(t_guess_hi.value);
    if hi - lo < 1e-9 {
        // Degenerate bracket (all inlets at one temperature): open it up.
        lo -= 1.0;
        hi += 1.0;
    }

    // Enthalpy is monotone increasing in T for physical heat capacities.
    let mut f_lo = h_at(lo)? - h_target;
    let mut f_hi = h_at(hi)? - h_target;
    let mut expansions = 0;
    while f_lo * f_hi > 0.0 {
        if expansions >= 16 {
            return Err(UnitError::Convergence {
                unit: unit.to_string(),
                what: format!("could not bracket outlet temperature for h={h_target:.3}"),
            });
        }
        let width = hi - lo;
        if f_lo > 0.0 {
            lo = (lo - width).max(1.0);
            f_lo = h_at(lo)? - h_target;
        } else {
            hi += width;
            f_hi = h_at(hi)? - h_target;
        }
        expansions += 1;
    }

    for _ in 0..MAX_INTERNAL_ITERS {
        let mid = 0.5 * (lo + hi);
        let f_mid = h_at(mid)? - h_target;
        if f_mid.abs() <= 1e-9 * h_target.abs().max(1.0) || hi - lo < 1e-9 {
            return Ok(k(mid));
        }
        if f_lo * f_mid <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    Err(UnitError::Convergence {
        unit: unit.to_string(),
        what: format!("enthalpy bisection did not converge for h={h_target:.3}"),
    })
}

/// Generate numbered port names ("in1", "in2", ...).
pub fn numbered_ports(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::pa;
    use cf_props::{ChemComponent, IdealPropertyPackage};

    #[test]
    fn species_flows_sum_over_streams() {
        let comp_a = Composition::from_fractions(vec![
            ("A".to_string(), 0.5),
            ("B".to_string(), 0.5),
        ])
        .unwrap();
        let s1 = Stream::new(2.0, k(300.0), pa(1e5), comp_a.clone());
        let s2 = Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("A"));
        let flows = species_flows([&s1, &s2]);
        assert!((flows["A"] - 2.0).abs() < 1e-12);
        assert!((flows["B"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_total_gets_uniform_composition() {
        let mut flows = BTreeMap::new();
        flows.insert("A".to_string(), 0.0);
        flows.insert("B".to_string(), 0.0);
        let (total, comp) = composition_from_flows("M1", &flows).unwrap();
        assert_eq!(total, 0.0);
        assert!((comp.fraction("A") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn enthalpy_inversion_recovers_temperature() {
        let pkg = IdealPropertyPackage::new(vec![ChemComponent::new("A", "A", 30.0, 100.0)])
            .unwrap();
        let comp = Composition::pure("A");
        let h = pkg.enthalpy(k(345.0), pa(1e5), &comp).unwrap();
        let t = solve_temperature_for_enthalpy(
            "T1",
            &pkg,
            &comp,
            pa(1e5),
            h,
            k(300.0),
            k(400.0),
        )
        .unwrap();
        assert!((t.value - 345.0).abs() < 1e-6);
    }

    #[test]
    fn enthalpy_inversion_outside_bracket_expands() {
        let pkg = IdealPropertyPackage::new(vec![ChemComponent::new("A", "A", 30.0, 100.0)])
            .unwrap();
        let comp = Composition::pure("A");
        let h = pkg.enthalpy(k(500.0), pa(1e5), &comp).unwrap();
        let t = solve_temperature_for_enthalpy(
            "T1",
            &pkg,
            &comp,
            pa(1e5),
            h,
            k(300.0),
            k(310.0),
        )
        .unwrap();
        assert!((t.value - 500.0).abs() < 1e-5);
    }

    #[test]
    fn numbered_ports_naming() {
        assert_eq!(numbered_ports("in", 2), vec!["in1", "in2"]);
    }
}
