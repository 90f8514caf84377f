use ndarray::Array2;

use crate::raster::Raster;

/// Binarize and smooth a raster with a square majority filter.
///
/// Pixels brighter than `threshold * 255` count as foreground. Each output
/// pixel becomes 255 when foreground fills more than half (by a 127/255
/// margin) of the `(2r + 1)^2` window around it and 0 otherwise. Windows are
/// clipped at the canvas edge and judged against the area that remains, so a
/// fully covered canvas stays fully covered. The whole canvas, padding
/// included, is filtered.
pub fn convolve(raster: &mut Raster, radius: usize, threshold: f64) {
    let cutoff = threshold * 255.0;
    let samples = raster.samples_mut();
    let (rows, cols) = samples.dim();

    // Summed-area table of the binarized canvas, one extra leading row and column of zeros.
    let mut table = Array2::<u32>::zeros((rows + 1, cols + 1));
    for r in 0..rows {
        let mut row_sum = 0;
        for c in 0..cols {
            if samples[[r, c]] as f64 > cutoff {
                row_sum += 1;
            }
            table[[r + 1, c + 1]] = table[[r, c + 1]] + row_sum;
        }
    }

    for r in 0..rows {
        let (r0, r1) = (r.saturating_sub(radius), (r + radius + 1).min(rows));
        for c in 0..cols {
            let (c0, c1) = (c.saturating_sub(radius), (c + radius + 1).min(cols));
            let count = (table[[r1, c1]] + table[[r0, c0]] - table[[r0, c1]] - table[[r1, c0]]) as u64;
            let area = ((r1 - r0) * (c1 - c0)) as u64;
            samples[[r, c]] = if count * 255 > area * 127 { 255 } else { 0 };
        }
    }
}
