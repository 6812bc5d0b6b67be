use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plate_track::{
    best::select_best,
    interpolate::interpolate,
    pipeline::Outcome,
    render::OverlayRenderer,
    video::{FrameSource, VideoReader, VideoWriter},
    Config, Pipeline, RecordStore,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gap filling, best-plate selection and video annotation for tracked license plates", long_about = None)]
struct Args {
    /// YAML config, defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill frame gaps of every track
    Interpolate { input: PathBuf, output: PathBuf },

    /// Keep the highest scoring plate reading of every track
    Best { input: PathBuf, output: PathBuf },

    /// Annotate a video from densified detections
    Render {
        video: PathBuf,
        detections: PathBuf,
        output: PathBuf,
    },

    /// Every stage, outputs laid out by the config
    Run { video: PathBuf, detections: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plate_track=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match args.command {
        Command::Interpolate { input, output } => {
            let store = load(&input)?;
            interpolate(&store)
                .to_path(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }

        Command::Best { input, output } => {
            let store = load(&input)?;
            let best = select_best(&store);
            best.to_store()
                .to_path(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;

            for failure in best.failures() {
                warn!("{}", failure);
            }
        }

        Command::Render {
            video,
            detections,
            output,
        } => {
            let dense = load(&detections)?;
            let mut source = VideoReader::open(&video)
                .with_context(|| format!("failed to open {}", video.display()))?;
            let mut sink = VideoWriter::new(&output, &config.render.fourcc, source.properties().fps)?;

            let renderer = OverlayRenderer::new(&config.render);
            let crops = renderer.extract_crops(&mut source, &select_best(&dense));
            let stats = renderer
                .render(&mut source, &mut sink, &dense, &crops)
                .with_context(|| format!("failed to render {}", output.display()))?;

            info!("{} frames written to {}", stats.frames_written, output.display());
        }

        Command::Run { video, detections } => {
            let pipeline = Pipeline::new(config);
            let paths = pipeline.output_paths(&video);

            match pipeline
                .run(&detections, &video)
                .with_context(|| format!("failed to process {}", video.display()))?
            {
                Outcome::NoResults => info!("No detections in {}", detections.display()),
                Outcome::Completed(summary) => {
                    info!(
                        "{} rows ({} rejected) densified to {} ({} synthetic)",
                        summary.raw_rows,
                        summary.rejected_rows,
                        summary.densified_rows,
                        summary.synthetic_rows
                    );
                    info!(
                        "{} tracks, {} unscoreable, {} without plate crop",
                        summary.tracks, summary.unscoreable_tracks, summary.dropped_crops
                    );
                    info!(
                        "{} frames written to {}, {} overlays skipped",
                        summary.frames_written,
                        paths.video.display(),
                        summary.overlays_skipped
                    );
                }
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<RecordStore> {
    let loaded = RecordStore::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(loaded.store)
}
