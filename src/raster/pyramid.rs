use anyhow::{Result, bail};
use log::trace;

use crate::geom::TileCoord;
use crate::raster::{Raster, RasterCache};
use crate::tileset::Settings;

/// Build the raster of `coord` from the cached rasters of the zoom below.
///
/// Each next-zoom tile in the 4x4 neighborhood is halved by 2x2 averaging
/// and placed where it lands on the parent canvas; whatever falls outside the
/// canvas is dropped. Padding that faces the edge of the world is filled by
/// replicating the nearest core pixels. Returns `None` when none of the four
/// direct children has a cached raster.
pub fn downsample(coord: TileCoord, cache: &RasterCache, settings: &Settings) -> Result<Option<Raster>> {
    if !coord.children().iter().any(|child| cache.contains(*child)) {
        return Ok(None);
    }

    let size = settings.raster_size as usize;
    let padding = settings.padding_pixels();
    let mut parent = Raster::new(size, padding);
    let mut placed = 0;

    for (row, cells) in coord.neighborhood().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let Some(child) = cell else { continue };
            let Some(raster) = cache.get(*child)? else { continue };
            if raster.size() != size {
                bail!(
                    "[raster::pyramid] cached raster for {child} is {}px, expected {size}px",
                    raster.size()
                );
            }
            place_child(&mut parent, &raster, col, row);
            placed += 1;
        }
    }
    trace!("[raster::pyramid] {coord} built from {placed} cached rasters");

    parent.replicate_edges(coord.world_edges());
    Ok(Some(parent))
}

/// Average `child`'s core down by 2x2 and write it into neighborhood cell `(col, row)`.
fn place_child(parent: &mut Raster, child: &Raster, col: usize, row: usize) {
    let half = (parent.size() / 2) as isize;
    let side = parent.canvas_size() as isize;
    let pad = parent.padding() as isize;
    let origin_x = pad + (col as isize - 1) * half;
    let origin_y = pad + (row as isize - 1) * half;

    let core = child.core();
    let u_range = (-origin_x).max(0)..(side - origin_x).min(half);
    let v_range = (-origin_y).max(0)..(side - origin_y).min(half);
    let samples = parent.samples_mut();
    for v in v_range {
        let (sy, ty) = (2 * v as usize, (origin_y + v) as usize);
        for u in u_range.clone() {
            let sx = 2 * u as usize;
            let sum = core[[sy, sx]] as u16
                + core[[sy, sx + 1]] as u16
                + core[[sy + 1, sx]] as u16
                + core[[sy + 1, sx + 1]] as u16;
            samples[[ty, (origin_x + u) as usize]] = average(sum);
        }
    }
}

/// Mean of four samples, rounded to nearest with ties to even.
fn average(sum: u16) -> u8 {
    let (quotient, remainder) = (sum / 4, sum % 4);
    let rounded = if remainder > 2 || (remainder == 2 && quotient % 2 == 1) { quotient + 1 } else { quotient };
    rounded as u8
}
