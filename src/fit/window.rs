//! Window selection over a polarization curve.

/// Points of `(e, i)` with `low ≤ e − e_ref ≤ high`, in their original order.
///
/// Both bounds are inclusive. An empty result is not an error here; the
/// solver rejects it later.
pub fn window_cut(e: &[f64], i: &[f64], e_ref: f64, window: [f64; 2]) -> (Vec<f64>, Vec<f64>) {
    let [low, high] = window;
    e.iter()
        .zip(i.iter())
        .filter(|&(&ev, _)| in_window(ev - e_ref, low, high))
        .map(|(&ev, &iv)| (ev, iv))
        .unzip()
}

/// Number of points [`window_cut`] would keep.
pub fn window_count(e: &[f64], e_ref: f64, window: [f64; 2]) -> usize {
    e.iter()
        .filter(|&&ev| in_window(ev - e_ref, window[0], window[1]))
        .count()
}

fn in_window(offset: f64, low: f64, high: f64) -> bool {
    low <= offset && offset <= high
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: [f64; 5] = [-0.2, -0.1, 0.0, 0.1, 0.2];
    const I: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    #[test]
    fn covering_window_keeps_everything_in_order() {
        let (e, i) = window_cut(&E, &I, 0.05, [-0.2 - 0.05 - 1.0, 0.2 - 0.05 + 1.0]);
        assert_eq!(e, E.to_vec());
        assert_eq!(i, I.to_vec());
    }

    #[test]
    fn window_without_data_is_empty() {
        let (e, i) = window_cut(&E, &I, 0.0, [0.5, 0.9]);
        assert!(e.is_empty());
        assert!(i.is_empty());
        assert_eq!(window_count(&E, 0.0, [0.5, 0.9]), 0);
    }

    #[test]
    fn window_is_relative_to_reference() {
        // Offsets: -0.25, -0.15, -0.05, 0.05, 0.15 (approximately).
        let (e, i) = window_cut(&E, &I, 0.05, [-0.16, 0.06]);
        assert_eq!(e, vec![-0.1, 0.0, 0.1]);
        assert_eq!(i, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn exact_bounds_with_zero_reference() {
        let (e, _) = window_cut(&E, &I, 0.0, [-0.1, 0.1]);
        assert_eq!(e, vec![-0.1, 0.0, 0.1]);
    }
}
