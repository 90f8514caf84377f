//! Raster to polygon generalization: smooth, trace, nest, simplify.

mod convolve;
mod nesting;
mod path;
mod simplify;
mod trace;

use geo::{Coord, Polygon};

use crate::raster::Raster;
use crate::tileset::Settings;

pub use convolve::convolve;
pub use nesting::nest;
pub use path::parse_path;
pub use simplify::simplify_ring;
pub use trace::{PathCommand, trace};

/// An open ring of vertices in canvas pixel coordinates.
pub type Ring = Vec<Coord<f64>>;

/// Turn a raster into simplified polygons in its canvas pixel coordinates.
///
/// Rings are nested before simplification so containment is decided on the
/// exact traced outlines.
pub fn generalize(mut raster: Raster, settings: &Settings) -> Vec<Polygon<f64>> {
    convolve(&mut raster, settings.convolution_radius as usize, settings.threshold);
    let commands = trace(&raster, settings.turd_size);
    let rings = parse_path(&commands);
    nest(rings)
        .iter()
        .filter_map(|polygon| simplify::simplify_polygon(polygon, settings.simplification_tolerance))
        .collect()
}
