//! Fixed-size grayscale tile rasters and the pyramid that links zoom levels.

mod cache;
mod pyramid;
mod rasterize;

use anyhow::{Result, bail};
use ndarray::{Array2, ArrayView2, s};

pub use cache::RasterCache;
pub use pyramid::downsample;
pub use rasterize::rasterize;

/// Sides of a raster, e.g. the ones that face the edge of the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

/// A square 8-bit canvas: `size` core pixels per side plus `padding` pixels on
/// every side, indexed `[row, col]`. 0 is background, 255 is forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    size: usize,
    padding: usize,
    samples: Array2<u8>,
}

impl Raster {
    /// An all-background raster.
    pub fn new(size: usize, padding: usize) -> Self {
        let side = size + 2 * padding;
        Self { size, padding, samples: Array2::zeros((side, side)) }
    }

    pub fn from_samples(size: usize, padding: usize, samples: Array2<u8>) -> Result<Self> {
        let side = size + 2 * padding;
        if samples.dim() != (side, side) {
            bail!("[raster] expected {side}x{side} samples, got {:?}", samples.dim());
        }
        Ok(Self { size, padding, samples })
    }

    pub fn size(&self) -> usize { self.size }

    pub fn padding(&self) -> usize { self.padding }

    /// Side length of the whole canvas, padding included.
    pub fn canvas_size(&self) -> usize { self.size + 2 * self.padding }

    pub fn samples(&self) -> &Array2<u8> { &self.samples }

    pub fn samples_mut(&mut self) -> &mut Array2<u8> { &mut self.samples }

    pub fn get(&self, x: usize, y: usize) -> u8 { self.samples[[y, x]] }

    pub fn set(&mut self, x: usize, y: usize, value: u8) { self.samples[[y, x]] = value; }

    /// The tile itself, without padding.
    pub fn core(&self) -> ArrayView2<'_, u8> {
        let (p, n) = (self.padding, self.size);
        self.samples.slice(s![p..p + n, p..p + n])
    }

    pub fn is_blank(&self) -> bool {
        self.samples.iter().all(|&v| v == 0)
    }

    /// Fill the padding on the given sides by repeating the outermost core row or column.
    pub fn replicate_edges(&mut self, sides: Sides) {
        let (p, n) = (self.padding, self.size);
        if p == 0 || n == 0 {
            return;
        }
        let side = self.canvas_size();
        let first = p;
        let last = p + n - 1;

        // Columns first over the full height, then rows over the full width,
        // so a corner takes the value of the nearest core pixel.
        for row in 0..side {
            if sides.left {
                let v = self.samples[[row, first]];
                self.samples.slice_mut(s![row, ..first]).fill(v);
            }
            if sides.right {
                let v = self.samples[[row, last]];
                self.samples.slice_mut(s![row, last + 1..]).fill(v);
            }
        }
        if sides.top {
            let edge = self.samples.row(first).to_owned();
            for row in 0..first {
                self.samples.row_mut(row).assign(&edge);
            }
        }
        if sides.bottom {
            let edge = self.samples.row(last).to_owned();
            for row in last + 1..side {
                self.samples.row_mut(row).assign(&edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Raster, Sides};

    #[test]
    fn core_excludes_padding() {
        let mut raster = Raster::new(4, 2);
        assert_eq!(raster.canvas_size(), 8);
        raster.set(2, 2, 255);
        raster.set(0, 0, 255);
        let core = raster.core();
        assert_eq!(core.dim(), (4, 4));
        assert_eq!(core[[0, 0]], 255);
        assert_eq!(core.iter().filter(|&&v| v == 255).count(), 1);
    }

    #[test]
    fn replicate_edges_copies_nearest_core_pixel() {
        let mut raster = Raster::new(2, 1);
        raster.set(1, 1, 10);
        raster.set(2, 1, 20);
        raster.set(1, 2, 30);
        raster.set(2, 2, 40);
        raster.replicate_edges(Sides { left: true, right: false, top: true, bottom: false });

        assert_eq!(raster.get(0, 1), 10);
        assert_eq!(raster.get(0, 2), 30);
        assert_eq!(raster.get(1, 0), 10);
        assert_eq!(raster.get(2, 0), 20);
        assert_eq!(raster.get(0, 0), 10);
        // Untouched sides stay as they were.
        assert_eq!(raster.get(3, 1), 0);
        assert_eq!(raster.get(1, 3), 0);
    }
}
