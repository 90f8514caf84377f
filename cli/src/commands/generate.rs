use anyhow::{Context, Result};
use canopy::{ContainerFormat, Settings};

/// Settings from `--settings` (or defaults) with any explicit flags applied on top.
fn resolve_settings(args: &crate::cli::GenerateArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    if let Some(v) = args.min_zoom { settings.min_zoom = v; }
    if let Some(v) = args.max_zoom { settings.max_zoom = v; }
    if let Some(v) = args.raster_size { settings.raster_size = v; }
    if let Some(v) = args.padding { settings.padding = v; }
    if let Some(v) = args.radius { settings.convolution_radius = v; }
    if let Some(v) = args.turd_size { settings.turd_size = v; }
    if let Some(v) = args.threshold { settings.threshold = v; }
    if let Some(v) = args.tolerance { settings.simplification_tolerance = v; }
    settings.validate().context("[generate] invalid settings")?;
    Ok(settings)
}

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::GenerateArgs) -> Result<()> {
    let settings = resolve_settings(args)?;
    let format: ContainerFormat = args.format.parse()?;
    let work = super::work_dir(&args.work);
    let output = args.output.clone().unwrap_or_else(|| "./tiles".into());

    if cli.verbose > 0 {
        eprintln!("[generate] settings {}", serde_json::to_string(&settings)?);
    }

    let tileset = canopy::generate(&args.input, &work, &output, &settings, format, args.threads, true)?;

    println!(
        "[generate] tileset {}: {} tiles written, {} failed, {:.1}s -> {}",
        tileset.id,
        tileset.telemetry.tile_count,
        tileset.telemetry.failed_count,
        tileset.telemetry.time,
        format.container_path(&output, &tileset.id).display()
    );
    Ok(())
}
