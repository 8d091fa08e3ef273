//! Grid indexing helpers shared by the interpolators

/// Map a coordinate to the lower sample index of its grid cell and the
/// fractional position within that cell.
///
/// `num_samples` is the sample count along the axis (at least 2); samples sit
/// at multiples of `resolution`. Coordinates outside the axis extent clamp to
/// the boundary cell, so a point exactly on (or beyond) the last sample comes
/// back as the last cell with weight 1.
pub(crate) fn cell_index(coord: f64, resolution: f64, num_samples: usize) -> (usize, f64) {
    let last = (num_samples - 1) as f64;
    let fractional = (coord / resolution).clamp(0.0, last);
    let index = (fractional.floor() as usize).min(num_samples - 2);
    (index, fractional - index as f64)
}
