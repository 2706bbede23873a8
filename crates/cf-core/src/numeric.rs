use crate::CfError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CfError::NonFinite { what, value: v })
    }
}

/// Floor applied to the denominator of relative-change calculations, so
/// zero-seeded quantities do not divide by zero.
pub const REL_CHANGE_FLOOR: Real = 1e-8;

/// Relative change of `new` against a reference `old`.
pub fn rel_change(old: Real, new: Real) -> Real {
    (new - old).abs() / old.abs().max(REL_CHANGE_FLOOR)
}
