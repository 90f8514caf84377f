mod bbox;
mod bound;
mod projection;
mod tile;

pub(crate) use bbox::BoundingBox;
pub use bound::Bound;
pub use projection::{lng_lat_to_mercator, mercator_to_lng_lat};
pub(crate) use tile::MAX_ZOOM;
pub use tile::{PixelSpace, TileCoord, tile_list, tile_list_range};
