/// Indices of local maxima.
///
/// A sample counts as a peak when its left neighbour is strictly lower and
/// the next differing sample to its right is strictly lower. A flat top
/// reports its middle index (rounded down). The first and last samples are
/// never peaks.
pub fn find_peaks(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let i_max = values.len() - 1;
    let mut i = 1;
    while i < i_max {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < i_max && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                let (left, right) = (i, ahead - 1);
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
