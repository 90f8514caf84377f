use anyhow::Result;
use canopy::Dataset;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::IndexArgs) -> Result<()> {
    let index_dir = super::work_dir(&args.work).join("index");
    log::info!("[index] reading {}", args.input.display());

    let dataset = Dataset::open_or_build(&args.input, &index_dir)?;

    let bound = dataset.bound();
    println!(
        "[index] {} geometries indexed in {}, bound [{}, {}, {}, {}] ({:.4} x {:.4} degrees)",
        dataset.len(),
        index_dir.display(),
        bound.min_x,
        bound.min_y,
        bound.max_x,
        bound.max_y,
        bound.width(),
        bound.height()
    );
    Ok(())
}
