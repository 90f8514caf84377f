use std::path::PathBuf;

/// Forest polygons to generalized vector tile pyramids
#[derive(clap::Parser, Debug)]
#[command(name = "canopy", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build the spatial index for an input file without rendering
    Index(IndexArgs),

    /// Render a tile pyramid (builds the index first if needed)
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct IndexArgs {
    /// Newline-delimited GeoJSON, one Polygon/MultiPolygon geometry or Feature per line
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Working directory for the index and raster cache, defaults to "./work"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub work: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Newline-delimited GeoJSON, one Polygon/MultiPolygon geometry or Feature per line
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Working directory for the index and raster cache, defaults to "./work"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub work: Option<PathBuf>,

    /// Output directory for containers and tilesets.json, defaults to "./tiles"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Container format: mbtiles, pmtiles or files
    #[arg(short, long, default_value = "mbtiles")]
    pub format: String,

    /// Worker threads, 0 for one per core
    #[arg(short = 'j', long, default_value_t = 0)]
    pub threads: usize,

    /// JSON file with settings; flags below override it
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    /// Coarsest zoom to render
    #[arg(long)]
    pub min_zoom: Option<u8>,

    /// Finest zoom to render (rasterized from geometry)
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Raster side in pixels
    #[arg(long)]
    pub raster_size: Option<u32>,

    /// Tile padding in extent units (out of 4096)
    #[arg(long)]
    pub padding: Option<u32>,

    /// Smoothing radius in pixels
    #[arg(long)]
    pub radius: Option<u32>,

    /// Drop traced specks of at most this many pixels
    #[arg(long)]
    pub turd_size: Option<u32>,

    /// Foreground threshold in [0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Simplification tolerance in pixels
    #[arg(long)]
    pub tolerance: Option<f64>,
}
