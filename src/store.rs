//! CSV-backed storage of detection records.
//!
//! Column layout is the one written by the perception stage:
//! `frame_nmr, car_id, car_bbox, license_plate_bbox, license_plate_bbox_score,
//! license_number, license_number_score, license_plate_color`.

use crate::bbox::BBox;
use crate::error::Error;
use crate::record::{DetectionRecord, Recognition, SENTINEL};
use crate::track::Track;

use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{info, warn};

const COLUMNS: [&str; 8] = [
    "frame_nmr",
    "car_id",
    "car_bbox",
    "license_plate_bbox",
    "license_plate_bbox_score",
    "license_number",
    "license_number_score",
    "license_plate_color",
];

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Row {
    frame_nmr: String,
    car_id: String,
    car_bbox: String,
    license_plate_bbox: String,
    license_plate_bbox_score: String,
    license_number: String,
    license_number_score: String,
    license_plate_color: String,
}

impl Row {
    /// `absent` lists the recognition columns missing from the header; those
    /// take the sentinel. Empty cells of present columns stay empty.
    fn into_record(self, absent: &[&str]) -> Result<DetectionRecord, Error> {
        let frame_index = parse_frame(&self.frame_nmr)?;
        let track_id = parse_track_id(&self.car_id)?;
        let vehicle_bbox = BBox::parse_legacy(&self.car_bbox)?;
        let plate_bbox = BBox::parse_legacy(&self.license_plate_bbox)?;

        let field = |column: &str, value: String| {
            if absent.contains(&column) {
                SENTINEL.to_string()
            } else {
                value
            }
        };

        let recognition = Recognition {
            plate_bbox_score: field("license_plate_bbox_score", self.license_plate_bbox_score),
            plate_text: field("license_number", self.license_number),
            plate_text_score: field("license_number_score", self.license_number_score),
            plate_color: field("license_plate_color", self.license_plate_color),
        };

        Ok(DetectionRecord::observed(
            frame_index,
            track_id,
            vehicle_bbox,
            plate_bbox,
            recognition,
        ))
    }

    fn from_record(rec: &DetectionRecord) -> Self {
        Self {
            frame_nmr: rec.frame_index.to_string(),
            car_id: rec.track_id.to_string(),
            car_bbox: rec.vehicle_bbox.to_legacy_string(),
            license_plate_bbox: rec.plate_bbox.to_legacy_string(),
            license_plate_bbox_score: rec.recognition.plate_bbox_score.clone(),
            license_number: rec.recognition.plate_text.clone(),
            license_number_score: rec.recognition.plate_text_score.clone(),
            license_plate_color: rec.recognition.plate_color.clone(),
        }
    }
}

fn parse_frame(value: &str) -> Result<u32, Error> {
    let value = value.trim();
    if let Ok(frame) = value.parse::<u32>() {
        return Ok(frame);
    }

    // tolerate "12.0" from float-typed exports, nothing else
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Ok(v as u32)
        }
        _ => Err(Error::MalformedField {
            column: "frame_nmr",
            value: value.to_string(),
        }),
    }
}

fn parse_track_id(value: &str) -> Result<i32, Error> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i32>() {
        return Ok(id);
    }

    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= i32::MAX as f64 => Ok(v.trunc() as i32),
        _ => Err(Error::MalformedField {
            column: "car_id",
            value: value.to_string(),
        }),
    }
}

/// A row that could not be turned into a record.
#[derive(Debug)]
pub struct RejectedRow {
    pub line: u64,
    pub error: Error,
}

#[derive(Debug)]
pub struct Loaded {
    pub store: RecordStore,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<DetectionRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<DetectionRecord>) -> Self {
        Self { records }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Loaded, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let loaded = Self::from_reader(file)?;

        info!(
            "Loaded {} records ({} rejected) from {}",
            loaded.store.len(),
            loaded.rejected.len(),
            path.display()
        );

        Ok(loaded)
    }

    /// Reads every row, collecting the ones that fail to parse instead of
    /// dropping or zero-filling them.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Loaded, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let absent: Vec<&str> = COLUMNS[4..]
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h.trim() == *column))
            .collect();
        let mut records = Vec::new();
        let mut rejected = Vec::new();

        for row in rdr.records() {
            let (line, parsed) = match row {
                Ok(row) => {
                    let line = row.position().map(|p| p.line()).unwrap_or(0);
                    let parsed = row
                        .deserialize::<Row>(Some(&headers))
                        .map_err(Error::from)
                        .and_then(|row| row.into_record(&absent));

                    (line, parsed)
                }
                Err(err) => {
                    let line = err.position().map(|p| p.line()).unwrap_or(0);
                    (line, Err(Error::from(err)))
                }
            };

            match parsed {
                Ok(rec) => records.push(rec),
                Err(error) => {
                    warn!("Rejected row at line {}: {}", line, error);
                    rejected.push(RejectedRow { line, error });
                }
            }
        }

        Ok(Loaded {
            store: Self { records },
            rejected,
        })
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::File::create(path)?;
        self.to_writer(file)?;

        info!("Wrote {} records to {}", self.len(), path.display());

        Ok(())
    }

    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::Writer::from_writer(writer);

        // serde only emits the header together with the first row
        if self.records.is_empty() {
            wtr.write_record(COLUMNS)?;
        }

        for rec in &self.records {
            wtr.serialize(Row::from_record(rec))?;
        }
        wtr.flush()?;

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.iter()
    }

    #[inline]
    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    #[inline]
    pub fn into_records(self) -> Vec<DetectionRecord> {
        self.records
    }

    /// Tracks in ascending id order, each sorted by frame.
    pub fn tracks(&self) -> Vec<Track<'_>> {
        let mut groups: BTreeMap<i32, Vec<&DetectionRecord>> = BTreeMap::new();
        for rec in &self.records {
            groups.entry(rec.track_id).or_default().push(rec);
        }

        groups
            .into_iter()
            .map(|(track_id, recs)| Track::new(track_id, recs))
            .collect()
    }

    pub fn track_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.records.iter().map(|r| r.track_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl FromIterator<DetectionRecord> for RecordStore {
    fn from_iter<I: IntoIterator<Item = DetectionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
