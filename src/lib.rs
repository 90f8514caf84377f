#![doc = "Canopy: generalized vector tile pyramids for forest polygons"]
mod common;
mod generalize;
mod geom;
mod index;
mod io;
mod pipeline;
mod raster;
mod tiles;
mod tileset;

#[doc(inline)]
pub use geom::{Bound, PixelSpace, TileCoord, lng_lat_to_mercator, mercator_to_lng_lat, tile_list, tile_list_range};

#[doc(inline)]
pub use index::{Dataset, GeometryStore, SpatialIndex};

#[doc(inline)]
pub use raster::{Raster, RasterCache, Sides, downsample, rasterize};

#[doc(inline)]
pub use generalize::{PathCommand, Ring, convolve, generalize, nest, parse_path, simplify_ring, trace};

#[doc(inline)]
pub use tiles::{ContainerFormat, FileSink, LAYER_NAME, TileMetadata, TileSink, encode_tile, tile_output};

#[cfg(feature = "mbtiles")]
#[doc(inline)]
pub use tiles::MbtilesSink;

#[cfg(feature = "pmtiles")]
#[doc(inline)]
pub use tiles::PmtilesSink;

#[doc(inline)]
pub use tileset::{EXTENT, Manifest, Settings, Telemetry, Tileset};

#[doc(inline)]
pub use pipeline::{Pipeline, RunSummary, TileOutcome, generate};
