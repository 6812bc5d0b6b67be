//! Two-pass annotation of the source video.
//!
//! Pass 1 cuts the best plate of every track out of its frame
//! ([`OverlayRenderer::extract_crops`]). Pass 2 replays the video from the
//! first frame, draws every densified record of the current frame and writes
//! the result, one output frame per input frame ([`OverlayRenderer::render`]).

mod crops;
pub mod overlay;

pub use crops::{DroppedCrop, PlateCrop, PlateCrops};

use crate::bbox::{BBox, Ltrb};
use crate::best::BestRecords;
use crate::config::RenderConfig;
use crate::error::Error;
use crate::frame::FrameIndex;
use crate::record::DetectionRecord;
use crate::store::RecordStore;
use crate::video::{FrameSink, FrameSource};

use opencv::{
    core::{self, Mat},
    prelude::*,
};
use overlay::PanelLayout;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_written: usize,
    /// Overlays left out for degenerate or out-of-frame geometry.
    pub overlays_skipped: usize,
}

pub struct OverlayRenderer {
    config: RenderConfig,
}

impl OverlayRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn extract_crops<S: FrameSource>(&self, source: &mut S, best: &BestRecords) -> PlateCrops {
        crops::extract_crops(source, best, &self.config)
    }

    /// Replays `source` into `sink`. The sink is released on every exit
    /// path, so a failed run still leaves a finalized output.
    pub fn render<S: FrameSource, K: FrameSink>(
        &self,
        source: &mut S,
        sink: &mut K,
        dense: &RecordStore,
        crops: &PlateCrops,
    ) -> Result<RenderStats, Error> {
        let result = self.render_frames(source, sink, dense, crops);
        let released = sink.release();

        let stats = result?;
        released?;

        info!(
            "Rendered {} frames, {} overlays skipped",
            stats.frames_written, stats.overlays_skipped
        );

        Ok(stats)
    }

    fn render_frames<S: FrameSource, K: FrameSink>(
        &self,
        source: &mut S,
        sink: &mut K,
        dense: &RecordStore,
        crops: &PlateCrops,
    ) -> Result<RenderStats, Error> {
        let index = FrameIndex::new(dense);
        let mut stats = RenderStats::default();
        let mut frame = Mat::default();

        source.seek(0)?;

        let mut frame_index = 0u32;
        while source.read(&mut frame)? {
            stats.overlays_skipped += self.annotate(&mut frame, index.get(frame_index), crops);
            sink.write(&frame)?;

            stats.frames_written += 1;
            frame_index += 1;
        }

        Ok(stats)
    }

    /// Draws `records` onto `frame` and returns how many overlays were left
    /// out. A failing overlay never affects the others.
    pub fn annotate(
        &self,
        frame: &mut Mat,
        records: &[&DetectionRecord],
        crops: &PlateCrops,
    ) -> usize {
        let frame_size = core::Size::new(frame.cols(), frame.rows());
        let mut skipped = 0;

        for rec in records {
            let crop = match crops.get(rec.track_id) {
                Some(crop) => crop,
                None => continue,
            };

            if visible(&rec.vehicle_bbox, frame_size) {
                let drawn = overlay::draw_corner_brackets(
                    frame,
                    &rec.vehicle_bbox,
                    overlay::scalar(self.config.vehicle_color),
                    self.config.vehicle_thickness,
                    self.config.corner_length_x,
                    self.config.corner_length_y,
                );
                skipped += self.settle(drawn, rec, "vehicle box");
            } else {
                skipped += 1;
            }

            if visible(&rec.plate_bbox, frame_size) {
                let drawn = overlay::draw_box(
                    frame,
                    &rec.plate_bbox,
                    overlay::scalar(self.config.plate_color),
                    self.config.plate_thickness,
                );
                skipped += self.settle(drawn, rec, "plate box");
            } else {
                skipped += 1;
            }

            let layout = PanelLayout::above(&rec.vehicle_bbox, crop.size(), &self.config);
            if !rec.vehicle_bbox.is_degenerate() && layout.fits(frame_size) {
                let drawn = overlay::draw_panel(frame, &layout, &crop.image, &crop.text, &self.config);
                skipped += self.settle(drawn, rec, "plate panel");
            } else {
                debug!(
                    "Frame {} track {}: plate panel outside of frame",
                    rec.frame_index, rec.track_id
                );
                skipped += 1;
            }
        }

        skipped
    }

    fn settle(&self, drawn: opencv::Result<()>, rec: &DetectionRecord, what: &str) -> usize {
        match drawn {
            Ok(()) => 0,
            Err(err) => {
                debug!(
                    "Frame {} track {}: {} skipped: {}",
                    rec.frame_index, rec.track_id, what, err
                );
                1
            }
        }
    }
}

/// Non-degenerate and overlapping the frame.
fn visible(bbox: &BBox<Ltrb>, frame_size: core::Size) -> bool {
    !bbox.is_degenerate()
        && bbox.right() > 0.0
        && bbox.bottom() > 0.0
        && bbox.left() < frame_size.width as f64
        && bbox.top() < frame_size.height as f64
}
