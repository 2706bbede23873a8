//! Tear-stream field vectors and Wegstein acceleration.
//!
//! Every tear stream is flattened to a fixed field vector
//! `[flow, temperature, pressure, x_1 .. x_n]` with composition entries in
//! name order. The layout is deterministic across passes because
//! compositions keep zero fractions and stay name-sorted.

use cf_core::{k, pa, Real};
use cf_props::{Composition, Stream};
use nalgebra::DVector;

/// Slope denominators below this are treated as degenerate.
const SLOPE_EPS: Real = 1e-12;

/// A secant slope this close to 1 would make the Wegstein factor blow up.
const UNIT_SLOPE_EPS: Real = 1e-6;

/// Accelerated steps larger than this multiple of the plain substitution
/// step are rejected field-wise.
const MAX_STEP_RATIO: Real = 100.0;

/// Number of scalar fields before the composition block.
const HEADER_FIELDS: usize = 3;

/// Flatten a stream to its field vector.
pub fn stream_to_vector(s: &Stream) -> DVector<Real> {
    let mut v = DVector::zeros(HEADER_FIELDS + s.composition.len());
    v[0] = s.flow;
    v[1] = s.temperature.value;
    v[2] = s.pressure.value;
    for (i, (_, frac)) in s.composition.iter().enumerate() {
        v[HEADER_FIELDS + i] = frac;
    }
    v
}

/// Rebuild a stream from a field vector, taking component names from the
/// template stream.
///
/// Non-physical values are clamped rather than rejected: flow and fractions
/// to zero, temperature to 1 K. Fractions are renormalized; if they sum to
/// zero the template composition is kept so the field layout survives.
pub fn stream_from_vector(template: &Stream, v: &DVector<Real>) -> Stream {
    let fractions: Vec<(String, Real)> = template
        .composition
        .names()
        .enumerate()
        .map(|(i, name)| (name.to_string(), v[HEADER_FIELDS + i].max(0.0)))
        .collect();
    let composition = Composition::from_fractions(fractions)
        .unwrap_or_else(|_| template.composition.clone());

    Stream::new(v[0].max(0.0), k(v[1].max(1.0)), pa(v[2].max(0.0)), composition)
}

/// Human-readable name of a field index, for traces and failure reports.
pub fn field_name(template: &Stream, index: usize) -> String {
    match index {
        0 => "flow".to_string(),
        1 => "temperature".to_string(),
        2 => "pressure".to_string(),
        i => template
            .composition
            .names()
            .nth(i - HEADER_FIELDS)
            .map(|n| format!("x_{n}"))
            .unwrap_or_else(|| format!("field_{i}")),
    }
}

/// Replace proposals that would drive a sign-constrained field negative with
/// the unaccelerated value for that field.
pub fn guard_physical(proposal: &mut DVector<Real>, computed: &DVector<Real>) {
    // Flow and every composition fraction must stay non-negative.
    if proposal[0] < 0.0 {
        proposal[0] = computed[0];
    }
    for i in HEADER_FIELDS..proposal.len() {
        if proposal[i] < 0.0 {
            proposal[i] = computed[i];
        }
    }
}

/// Per-tear Wegstein accelerator.
///
/// Works field-by-field on the stream vector: each scalar gets its own
/// secant slope through the last two (input, output) pairs. Degenerate
/// slopes, near-unit slopes, and oversized steps all fall back to plain
/// substitution for that field only, so one flat field never stalls the
/// others.
#[derive(Debug, Clone, Default)]
pub struct Wegstein {
    enabled: bool,
    prev: Option<(DVector<Real>, DVector<Real>)>,
}

impl Wegstein {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            prev: None,
        }
    }

    /// Propose the next tear guess from the current input `x` and the value
    /// `gx` the flowsheet computed for it.
    ///
    /// The first call (and every call with acceleration disabled) is plain
    /// substitution.
    pub fn propose(&mut self, x: &DVector<Real>, gx: &DVector<Real>) -> DVector<Real> {
        let next = match &self.prev {
            Some((x0, g0)) if self.enabled && x0.len() == x.len() => {
                let mut out = gx.clone();
                for i in 0..x.len() {
                    let dx = x[i] - x0[i];
                    if dx.abs() < SLOPE_EPS {
                        continue;
                    }
                    let slope = (gx[i] - g0[i]) / dx;
                    if (slope - 1.0).abs() < UNIT_SLOPE_EPS {
                        continue;
                    }
                    let q = slope / (slope - 1.0);
                    let candidate = q * x[i] + (1.0 - q) * gx[i];
                    let sub_step = (gx[i] - x[i]).abs();
                    if (candidate - gx[i]).abs() > MAX_STEP_RATIO * sub_step.max(SLOPE_EPS) {
                        continue;
                    }
                    out[i] = candidate;
                }
                out
            }
            _ => gx.clone(),
        };
        self.prev = Some((x.clone(), gx.clone()));
        next
    }

    /// Drop the history, forcing the next proposal back to substitution.
    pub fn reset(&mut self) {
        self.prev = None;
    }
}
