//! Turns raw video into observed detection records.
//!
//! The detectors, the tracker and the plate reader are black boxes behind
//! the traits below; a [`PerceptionRunner`] owns one handle of each and
//! drives them frame by frame.

use crate::bbox::{BBox, Ltrb};
use crate::config::PerceptionConfig;
use crate::detection::{Detection, TrackedVehicle};
use crate::error::Error;
use crate::record::{DetectionRecord, Recognition};
use crate::render::overlay;
use crate::store::RecordStore;
use crate::video::FrameSource;

use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

pub trait VehicleDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>, Error>;
}

pub trait VehicleTracker {
    /// Feeds one frame of vehicle detections, returns the boxes tracked in it.
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedVehicle>, Error>;
}

pub trait PlateDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>, Error>;
}

pub trait PlateReader {
    /// Reads a thresholded plate image, `None` when nothing legible was found.
    fn read(&mut self, plate: &Mat) -> Result<Option<PlateReading>, Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateReading {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateColor {
    Green,
    Yellow,
    White,
    Unknown,
}

impl fmt::Display for PlateColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlateColor::Green => "Green",
            PlateColor::Yellow => "Yellow",
            PlateColor::White => "White",
            PlateColor::Unknown => "Unknown",
        };

        f.write_str(name)
    }
}

/// First tracked vehicle whose box strictly contains `plate`.
pub fn associate_plate<'a>(
    plate: &BBox<Ltrb>,
    vehicles: &'a [TrackedVehicle],
) -> Option<&'a TrackedVehicle> {
    vehicles.iter().find(|v| v.bbox().contains(plate))
}

/// Classifies by the mean HSV of the crop, OpenCV 8-bit ranges.
pub fn classify_plate_color(crop: &Mat) -> Result<PlateColor, Error> {
    if crop.empty() {
        return Ok(PlateColor::Unknown);
    }

    let mut hsv = Mat::default();
    imgproc::cvt_color_def(crop, &mut hsv, imgproc::COLOR_BGR2HSV)?;
    let [h, s, v, _] = core::mean_def(&hsv)?.0;

    Ok(if (35.0..=85.0).contains(&h) && s > 50.0 && v > 50.0 {
        PlateColor::Green
    } else if (20.0..=35.0).contains(&h) && s > 50.0 && v > 50.0 {
        PlateColor::Yellow
    } else if v > 150.0 && s < 50.0 {
        PlateColor::White
    } else {
        PlateColor::Unknown
    })
}

/// Grayscale then inverse binary threshold: pixels brighter than
/// `threshold` go to 0, the rest to 255.
pub fn threshold_plate(crop: &Mat, threshold: u8) -> Result<Mat, Error> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(crop, &mut gray, imgproc::COLOR_BGR2GRAY)?;

    let mut out = Mat::default();
    imgproc::threshold(
        &gray,
        &mut out,
        threshold as f64,
        255.0,
        imgproc::THRESH_BINARY_INV,
    )?;

    Ok(out)
}

pub struct PerceptionRunner<V, T, P, R> {
    vehicles: V,
    tracker: T,
    plates: P,
    reader: R,
    config: PerceptionConfig,
}

impl<V, T, P, R> PerceptionRunner<V, T, P, R>
where
    V: VehicleDetector,
    T: VehicleTracker,
    P: PlateDetector,
    R: PlateReader,
{
    pub fn new(vehicles: V, tracker: T, plates: P, reader: R, config: PerceptionConfig) -> Self {
        Self {
            vehicles,
            tracker,
            plates,
            reader,
            config,
        }
    }

    /// Decodes `source` from the first frame and records every plate that
    /// could be tied to a tracked vehicle and read.
    pub fn run<S: FrameSource>(&mut self, source: &mut S) -> Result<RecordStore, Error> {
        let mut records = Vec::new();
        let mut frame = Mat::default();
        let mut frame_index = 0u32;

        source.seek(0)?;

        while source.read(&mut frame)? {
            let found = self.process_frame(frame_index, &frame)?;
            debug!("Frame {}: {} plates read", frame_index, found.len());

            records.extend(found);
            frame_index += 1;
        }

        info!(
            "Processed {} frames, {} plate readings",
            frame_index,
            records.len()
        );

        Ok(RecordStore::new(records))
    }

    /// One record per track for `frame`, in ascending track id order.
    pub fn process_frame(
        &mut self,
        frame_index: u32,
        frame: &Mat,
    ) -> Result<Vec<DetectionRecord>, Error> {
        let frame_size = core::Size::new(frame.cols(), frame.rows());

        let vehicles: Vec<Detection> = self
            .vehicles
            .detect(frame)?
            .into_iter()
            .filter(|d| self.config.vehicle_classes.contains(&d.class))
            .collect();

        let tracked = self.tracker.update(&vehicles)?;
        let mut by_track = BTreeMap::new();

        for plate in self.plates.detect(frame)? {
            let plate_bbox = plate.bbox();
            let vehicle = match associate_plate(&plate_bbox, &tracked) {
                Some(v) => v,
                None => continue,
            };

            let rect = match overlay::clip_rect(&plate_bbox, frame_size) {
                Some(rect) => rect,
                None => continue,
            };

            let crop = overlay::crop_region(frame, rect)?;
            let binary = threshold_plate(&crop, self.config.plate_threshold)?;

            let reading = match self.reader.read(&binary)? {
                Some(reading) => reading,
                None => continue,
            };

            let color = classify_plate_color(&crop)?;

            by_track.insert(
                vehicle.track_id,
                DetectionRecord::observed(
                    frame_index,
                    vehicle.track_id,
                    vehicle.bbox(),
                    plate_bbox,
                    Recognition {
                        plate_bbox_score: plate.confidence.to_string(),
                        plate_text: reading.text,
                        plate_text_score: reading.confidence.to_string(),
                        plate_color: color.to_string(),
                    },
                ),
            );
        }

        Ok(by_track.into_values().collect())
    }
}
