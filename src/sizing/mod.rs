//! Grid searches over storage and PV sizes.

/// Additional PV capacity sizing.
pub mod pv;
pub mod storage;

pub use pv::{PvRecommendation, recommend_pv};
pub use storage::{Recommendation, SizingContext, SizingRun, optimize};

/// Position of the strictly smallest finite key; ties keep the earliest.
///
/// Returns `None` when every key is infinite or NaN.
pub(crate) fn first_minimum(keys: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, key) in keys.into_iter().enumerate() {
        if !key.is_finite() {
            continue;
        }
        match best {
            Some((_, best_key)) if key >= best_key => {}
            _ => best = Some((i, key)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::first_minimum;

    #[test]
    fn picks_strict_minimum() {
        assert_eq!(first_minimum([5.0, 3.0, 4.0]), Some(1));
    }

    #[test]
    fn ties_keep_first() {
        assert_eq!(first_minimum([4.0, 2.0, 2.0, 3.0]), Some(1));
    }

    #[test]
    fn infinite_keys_never_win() {
        assert_eq!(first_minimum([f64::INFINITY, 7.0]), Some(1));
        assert_eq!(first_minimum([f64::INFINITY, f64::NAN]), None);
        assert_eq!(first_minimum(std::iter::empty()), None);
    }
}
