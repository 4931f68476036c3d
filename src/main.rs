use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use isocline::config::load_config;
use isocline::field::coords::CoordSystem;
use isocline::field::sampler::GridSpec;
use isocline::field::{render_field, FieldOptions};
use isocline::plot::render::render_png;

/// Render a slope field for a calculator-style expression.
#[derive(Parser, Debug)]
#[command(name = "isocline", version, about)]
struct Args {
    /// The derivative expression, TI-84 style: `sin(x*y) + cos(x - y)`,
    /// `r^2 theta`, `z^2 + 1`, ...
    #[arg(short, long)]
    function: String,

    /// Coordinate system for grid generation and segment placement.
    #[arg(long, value_enum, default_value_t = CoordSystem::Cartesian)]
    coords: CoordSystem,

    /// Half-width of the sampled region: each native coordinate spans
    /// [-extent, extent]. Defaults to the config file value (10).
    #[arg(short = 'd', long)]
    extent: Option<f64>,

    /// Grid resolution: N sample points per axis. Defaults to the config
    /// file value (20).
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Output PNG path.
    #[arg(short, long, default_value = "slope_field.png")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = load_config();

    let grid = GridSpec::new(
        args.extent.unwrap_or(config.extent),
        args.steps.unwrap_or(config.steps),
    );
    if grid.steps == 0 {
        anyhow::bail!("steps must be at least 1");
    }
    if !(grid.extent > 0.0) {
        anyhow::bail!("extent must be positive");
    }

    let mut opts = FieldOptions {
        segment_len: config.segment_len,
        ..FieldOptions::default()
    };
    opts.palette.rel_tol = config.cluster_rel_tol;

    info!(
        function = %args.function,
        coords = %args.coords,
        extent = grid.extent,
        steps = grid.steps,
        "rendering slope field"
    );

    let field = match render_field(&args.function, args.coords, grid, &opts) {
        Ok(field) => field,
        Err(e) => {
            if let Some(snippet) = e.offending(&args.function) {
                error!("cannot parse '{}': {} (near '{}')", args.function, e.message, snippet);
            } else {
                error!("cannot parse '{}': {}", args.function, e.message);
            }
            std::process::exit(1);
        }
    };

    if field.stats.omitted() > 0 {
        warn!(
            domain_errors = field.stats.domain_errors,
            transform_errors = field.stats.transform_errors,
            "omitted {} of {} grid points",
            field.stats.omitted(),
            field.stats.grid_points
        );
    }
    info!(
        segments = field.segments.len(),
        buckets = field.palette.len(),
        "field computed"
    );

    let rendered = render_png(&field.segments, config.plot_width, config.plot_height)
        .map_err(|e| anyhow::anyhow!("render failed: {}", e))?;
    std::fs::write(&args.output, &rendered.png_bytes)?;
    info!("wrote {}", args.output.display());

    Ok(())
}
