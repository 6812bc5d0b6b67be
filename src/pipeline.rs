//! Batch orchestration: detections in, densified CSV, best-record CSV and
//! annotated video out. Stages run strictly one after another.

use crate::best::select_best;
use crate::config::{Config, OutputConfig};
use crate::error::Error;
use crate::interpolate::interpolate;
use crate::render::OverlayRenderer;
use crate::store::{Loaded, RecordStore};
use crate::video::{FrameSink, FrameSource, VideoReader, VideoWriter};

use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub interpolated_csv: PathBuf,
    pub best_csv: PathBuf,
    pub video: PathBuf,
}

impl OutputPaths {
    /// Everything under `output.dir`; the video keeps the source file name
    /// with `output.video_suffix` appended to its stem.
    pub fn new(output: &OutputConfig, video: &Path) -> Self {
        let dir = Path::new(&output.dir);
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let ext = video
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".to_string());

        Self {
            interpolated_csv: dir.join(&output.interpolated_csv),
            best_csv: dir.join(&output.best_csv),
            video: dir.join(format!("{}{}.{}", stem, output.video_suffix, ext)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub raw_rows: usize,
    pub rejected_rows: usize,
    pub densified_rows: usize,
    pub synthetic_rows: usize,
    pub tracks: usize,
    pub unscoreable_tracks: usize,
    pub dropped_crops: usize,
    pub frames_written: usize,
    pub overlays_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The detection set was empty; nothing was written.
    NoResults,
    Completed(Summary),
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_paths(&self, video: &Path) -> OutputPaths {
        OutputPaths::new(&self.config.output, video)
    }

    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        detections_csv: P,
        video: Q,
    ) -> Result<Outcome, Error> {
        let video = video.as_ref();
        let loaded = RecordStore::from_path(detections_csv)?;

        if loaded.store.is_empty() {
            info!("No detections, nothing to do");
            return Ok(Outcome::NoResults);
        }

        let mut source = VideoReader::open(video)?;
        let paths = self.output_paths(video);
        let mut sink = VideoWriter::new(
            &paths.video,
            &self.config.render.fourcc,
            source.properties().fps,
        )?;

        self.process(loaded, &mut source, &mut sink, &paths)
            .map(Outcome::Completed)
    }

    /// Runs every stage after loading against an already opened video.
    pub fn process<S: FrameSource, K: FrameSink>(
        &self,
        loaded: Loaded,
        source: &mut S,
        sink: &mut K,
        paths: &OutputPaths,
    ) -> Result<Summary, Error> {
        let Loaded { store, rejected } = loaded;

        let dense = interpolate(&store);
        dense.to_path(&paths.interpolated_csv)?;
        info!("Densified detections written to {}", paths.interpolated_csv.display());

        let best = select_best(&dense);
        best.to_store().to_path(&paths.best_csv)?;
        info!("Best records written to {}", paths.best_csv.display());

        let renderer = OverlayRenderer::new(&self.config.render);
        let crops = renderer.extract_crops(source, &best);
        let stats = renderer.render(source, sink, &dense, &crops)?;

        Ok(Summary {
            raw_rows: store.len(),
            rejected_rows: rejected.len(),
            densified_rows: dense.len(),
            synthetic_rows: dense.iter().filter(|r| r.is_synthetic()).count(),
            tracks: best.len() + best.failures().len(),
            unscoreable_tracks: best.failures().len(),
            dropped_crops: crops.dropped.len(),
            frames_written: stats.frames_written,
            overlays_skipped: stats.overlays_skipped,
        })
    }
}
