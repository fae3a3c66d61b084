mod config;
mod error;
mod navigation;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dsbrot_core::{Lane, Resolution};
use dsbrot_render::{export_png, render_frame, ExportMetadata, RenderCancel};

use config::{Arithmetic, JobConfig};
use error::Result;
use navigation::ViewState;

/// Render one Mandelbrot frame with extended-precision arithmetic.
#[derive(Debug, Parser)]
#[command(name = "dsbrot", version, long_about = None)]
#[command(after_help = "Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.")]
struct Args {
    /// JSON job file; without it the starting view is rendered at 800x600
    #[arg(short, long, value_name = "JOB.json")]
    config: Option<PathBuf>,

    /// Output PNG, overriding the job's `output`
    #[arg(short, long, value_name = "FRAME.png")]
    output: Option<PathBuf>,
}

/// Render the job's view with lanes of type `L` and write the PNG.
fn render_job<L: Lane>(
    config: &JobConfig,
    view: &ViewState,
    resolution: Resolution,
) -> Result<()> {
    let params = view.snapshot::<L>(resolution)?;
    let cancel = RenderCancel::new();
    let (result, image) =
        render_frame(params, config.kernel, resolution, &config.coloring, &cancel);

    let metadata =
        ExportMetadata::from_frame(&params, &config.kernel, &config.coloring, resolution);
    export_png(&image, &config.output, &metadata)?;

    info!(
        arithmetic = L::NAME,
        escaped = result.iterations.escaped_count(),
        elapsed_ms = result.elapsed.as_millis(),
        output = %config.output.display(),
        "Frame written"
    );
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };
    if let Some(output) = args.output {
        config.output = output;
    }

    let resolution = config.resolution()?;
    let view = config.view()?;
    info!(
        width = resolution.width,
        height = resolution.height,
        center_re = view.center[0],
        center_im = view.center[1],
        scale = view.scale,
        max_iterations = view.max_iterations,
        "Rendering job"
    );

    match config.arithmetic {
        Arithmetic::DoubleSingle => render_job::<f32>(&config, &view, resolution),
        Arithmetic::DoubleDouble => render_job::<f64>(&config, &view, resolution),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting dsbrot");
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_config_and_output() {
        let parsed =
            Args::try_parse_from(["dsbrot", "--config", "job.json", "-o", "out.png"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("job.json")));
        assert_eq!(parsed.output, Some(PathBuf::from("out.png")));

        let bare = Args::try_parse_from(["dsbrot"]).unwrap();
        assert_eq!((bare.config, bare.output), (None, None));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Args::try_parse_from(["dsbrot", "--config"]).is_err());
        let unknown = Args::try_parse_from(["dsbrot", "--zoom", "3"]).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
        let help = Args::try_parse_from(["dsbrot", "-h"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn run_writes_frame_for_both_arithmetics() {
        let dir = std::env::temp_dir().join(format!("dsbrot_run_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for (name, arithmetic) in [("ds", "double_single"), ("dd", "double_double")] {
            let job = dir.join(format!("{name}.json"));
            let output = dir.join(format!("{name}.png"));
            std::fs::write(
                &job,
                format!(
                    r#"{{ "width": 48, "height": 32, "max_iterations": 32, "arithmetic": "{arithmetic}" }}"#
                ),
            )
            .unwrap();
            run(Args {
                config: Some(job),
                output: Some(output.clone()),
            })
            .unwrap();

            assert_eq!(png_dimensions(&output), (48, 32));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn png_dimensions(path: &std::path::Path) -> (u32, u32) {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR: width and height are the first two big-endian u32s of its data.
        let w = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let h = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        (w, h)
    }
}
