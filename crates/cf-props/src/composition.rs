//! Stream composition (component name -> fraction).

use crate::error::{PropertyError, PropertyResult};
use cf_core::{nearly_equal, Real, Tolerances};

/// Component fractions of a stream, normalized to sum to 1.
///
/// Entries are kept sorted by component name so that flattening a stream to a
/// field vector is deterministic across iterations. Zero fractions are kept
/// rather than dropped: a recycle loop may drive a fraction to zero and back,
/// and the field layout must stay stable while it does.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Composition {
    items: Vec<(String, Real)>,
}

impl Composition {
    /// Create a single-component composition.
    pub fn pure(name: impl Into<String>) -> Self {
        Self {
            items: vec![(name.into(), 1.0)],
        }
    }

    /// Create a composition from fractions.
    ///
    /// Validates that all fractions are finite and non-negative with a
    /// positive sum, then normalizes to sum=1 and sorts by component name.
    pub fn from_fractions(
        fractions: impl IntoIterator<Item = (String, Real)>,
    ) -> PropertyResult<Self> {
        let mut items: Vec<(String, Real)> = fractions.into_iter().collect();
        if items.is_empty() {
            return Err(PropertyError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut sum = 0.0;
        for (_, frac) in &items {
            if !frac.is_finite() {
                return Err(PropertyError::NonPhysical {
                    what: "non-finite fraction",
                });
            }
            if *frac < 0.0 {
                return Err(PropertyError::NonPhysical {
                    what: "negative fraction",
                });
            }
            sum += frac;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(PropertyError::NonPhysical {
                what: "fractions sum to zero or non-finite",
            });
        }

        items.sort_by(|(a, _), (b, _)| a.cmp(b));
        for i in 1..items.len() {
            if items[i - 1].0 == items[i].0 {
                return Err(PropertyError::InvalidArg {
                    what: "duplicate component in composition",
                });
            }
        }
        for (_, frac) in &mut items {
            *frac /= sum;
        }

        Ok(Self { items })
    }

    /// Get the fraction of a component (0.0 if not present).
    pub fn fraction(&self, name: &str) -> Real {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Whether the composition lists this component (even at fraction zero).
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|(n, _)| n == name)
    }

    /// Number of listed components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over component names and fractions, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> + '_ {
        self.items.iter().map(|(n, f)| (n.as_str(), *f))
    }

    /// Component names, in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|(n, _)| n.as_str())
    }

    /// Check the sum-to-one invariant against the given tolerances.
    pub fn is_normalized(&self, tol: Tolerances) -> bool {
        let sum: Real = self.items.iter().map(|(_, f)| f).sum();
        nearly_equal(sum, 1.0, tol)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_sum_is_one(fracs in prop::collection::vec(0.0_f64..1.0_f64, 1..6)) {
            let names = ["A", "B", "C", "D", "E", "F"];
            let input: Vec<(String, f64)> = fracs
                .iter()
                .enumerate()
                .map(|(i, &f)| (names[i].to_string(), f))
                .collect();

            if let Ok(comp) = Composition::from_fractions(input) {
                let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
                prop_assert!(comp.is_normalized(tol));
            }
        }
    }
}
