use super::overlay;
use crate::best::BestRecords;
use crate::config::RenderConfig;
use crate::error::Error;
use crate::math::scaled_width;
use crate::record::DetectionRecord;
use crate::video::FrameSource;

use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Best-plate image of one track, already scaled to the panel height.
pub struct PlateCrop {
    pub image: Mat,
    pub text: String,
    pub frame_index: u32,
}

impl PlateCrop {
    #[inline]
    pub fn size(&self) -> core::Size {
        core::Size::new(self.image.cols(), self.image.rows())
    }
}

#[derive(Debug)]
pub struct DroppedCrop {
    pub track_id: i32,
    pub reason: Error,
}

#[derive(Default)]
pub struct PlateCrops {
    pub crops: HashMap<i32, PlateCrop>,
    pub dropped: Vec<DroppedCrop>,
}

impl PlateCrops {
    #[inline]
    pub fn get(&self, track_id: i32) -> Option<&PlateCrop> {
        self.crops.get(&track_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

/// Decodes the frame of every best record and cuts out its plate. Tracks
/// whose frame cannot be decoded or whose plate box misses the frame are
/// reported in `dropped` and rendered without overlays.
pub fn extract_crops<S: FrameSource>(
    source: &mut S,
    best: &BestRecords,
    config: &RenderConfig,
) -> PlateCrops {
    let mut out = PlateCrops::default();
    let mut frame = Mat::default();

    for rec in best.iter() {
        match extract_one(source, &mut frame, rec, config) {
            Ok(crop) => {
                debug!(
                    "Track {}: plate crop {}x{} from frame {}",
                    rec.track_id,
                    crop.image.cols(),
                    crop.image.rows(),
                    rec.frame_index
                );
                out.crops.insert(rec.track_id, crop);
            }
            Err(reason) => {
                warn!("Track {}: no plate crop: {}", rec.track_id, reason);
                out.dropped.push(DroppedCrop {
                    track_id: rec.track_id,
                    reason,
                });
            }
        }
    }

    info!(
        "Extracted {} plate crops ({} dropped)",
        out.crops.len(),
        out.dropped.len()
    );

    out
}

fn extract_one<S: FrameSource>(
    source: &mut S,
    frame: &mut Mat,
    rec: &DetectionRecord,
    config: &RenderConfig,
) -> Result<PlateCrop, Error> {
    source.seek(rec.frame_index)?;
    if !source.read(frame)? {
        return Err(Error::FrameSeek {
            frame_index: rec.frame_index,
        });
    }

    let frame_size = core::Size::new(frame.cols(), frame.rows());
    let rect = overlay::clip_rect(&rec.plate_bbox, frame_size).ok_or_else(|| Error::MalformedBox {
        value: rec.plate_bbox.to_legacy_string(),
    })?;

    let patch = overlay::crop_region(frame, rect)?;
    let width = scaled_width(rect.width as f64, rect.height as f64, config.crop_height);

    let mut image = Mat::default();
    imgproc::resize(
        &patch,
        &mut image,
        core::Size::new(width.max(1), config.crop_height),
        0.,
        0.,
        imgproc::INTER_LINEAR,
    )?;

    Ok(PlateCrop {
        image,
        text: rec.recognition.plate_text.clone(),
        frame_index: rec.frame_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::{BBox, Ltrb};
    use crate::best::select_best;
    use crate::record::Recognition;
    use crate::store::RecordStore;
    use crate::video::memory::MemorySource;

    fn observed(frame: u32, track: i32, plate: BBox<Ltrb>, score: &str) -> DetectionRecord {
        DetectionRecord::observed(
            frame,
            track,
            BBox::ltrb(0.0, 0.0, 60.0, 60.0),
            plate,
            Recognition {
                plate_bbox_score: "0.9".to_string(),
                plate_text: format!("T{}", track),
                plate_text_score: score.to_string(),
                plate_color: "0".to_string(),
            },
        )
    }

    #[test]
    fn test_crop_resized_to_target_height() {
        let mut source = MemorySource::solid(5, 64, 48, [10.0, 20.0, 30.0]);
        let store = RecordStore::new(vec![observed(2, 1, BBox::ltrb(4.0, 4.0, 24.0, 14.0), "0.8")]);
        let best = select_best(&store);
        let config = RenderConfig {
            crop_height: 40,
            ..RenderConfig::default()
        };

        let crops = extract_crops(&mut source, &best, &config);
        let crop = crops.get(1).unwrap();

        assert!(crops.dropped.is_empty());
        assert_eq!(crop.size(), core::Size::new(80, 40));
        assert_eq!(crop.text, "T1");
        assert_eq!(crop.frame_index, 2);
        assert_eq!(crop.image.at_2d::<core::Vec3b>(20, 40).unwrap().0, [10, 20, 30]);
    }

    #[test]
    fn test_undecodable_frame_drops_track() {
        let mut source = MemorySource::solid(3, 64, 48, [0.0, 0.0, 0.0]);
        let store = RecordStore::new(vec![
            observed(1, 1, BBox::ltrb(4.0, 4.0, 24.0, 14.0), "0.8"),
            observed(3, 2, BBox::ltrb(4.0, 4.0, 24.0, 14.0), "0.8"),
            observed(9, 3, BBox::ltrb(4.0, 4.0, 24.0, 14.0), "0.8"),
        ]);
        let best = select_best(&store);

        let crops = extract_crops(&mut source, &best, &RenderConfig::default());

        assert_eq!(crops.len(), 1);
        assert!(crops.get(1).is_some());
        assert_eq!(crops.dropped.len(), 2);
        assert!(matches!(
            crops.dropped[0].reason,
            Error::FrameSeek { frame_index: 3 }
        ));
        assert!(matches!(
            crops.dropped[1].reason,
            Error::FrameSeek { frame_index: 9 }
        ));
    }

    #[test]
    fn test_plate_outside_frame_drops_track() {
        let mut source = MemorySource::solid(2, 64, 48, [0.0, 0.0, 0.0]);
        let store = RecordStore::new(vec![
            observed(0, 1, BBox::ltrb(70.0, 4.0, 90.0, 14.0), "0.8"),
            observed(0, 2, BBox::ltrb(50.0, 40.0, 80.0, 60.0), "0.8"),
        ]);
        let best = select_best(&store);

        let crops = extract_crops(&mut source, &best, &RenderConfig::default());

        assert!(crops.get(1).is_none());
        assert!(matches!(crops.dropped[0].reason, Error::MalformedBox { .. }));
        // clipped to the 14x8 part inside the frame
        assert_eq!(crops.get(2).unwrap().size(), core::Size::new(700, 400));
    }
}
