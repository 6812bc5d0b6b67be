use crate::bbox::{BBox, Ltrb};

/// Placeholder written for every recognition field that has no reading.
pub const SENTINEL: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read directly from perception output.
    Observed,
    /// Filled in by gap interpolation.
    Synthetic,
}

/// Plate recognition fields of a record, kept verbatim as read.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub plate_bbox_score: String,
    pub plate_text: String,
    pub plate_text_score: String,
    pub plate_color: String,
}

impl Recognition {
    pub fn sentinel() -> Self {
        Self {
            plate_bbox_score: SENTINEL.to_string(),
            plate_text: SENTINEL.to_string(),
            plate_text_score: SENTINEL.to_string(),
            plate_color: SENTINEL.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.plate_bbox_score == SENTINEL
            && self.plate_text == SENTINEL
            && self.plate_text_score == SENTINEL
            && self.plate_color == SENTINEL
    }

    /// Numeric `license_number_score`, `None` when missing or not a finite number.
    pub fn text_score(&self) -> Option<f64> {
        parse_score(&self.plate_text_score)
    }
}

impl Default for Recognition {
    fn default() -> Self {
        Self::sentinel()
    }
}

pub fn parse_score(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub frame_index: u32,
    pub track_id: i32,
    pub vehicle_bbox: BBox<Ltrb>,
    pub plate_bbox: BBox<Ltrb>,
    pub recognition: Recognition,
    pub origin: Origin,
}

impl DetectionRecord {
    pub fn observed(
        frame_index: u32,
        track_id: i32,
        vehicle_bbox: BBox<Ltrb>,
        plate_bbox: BBox<Ltrb>,
        recognition: Recognition,
    ) -> Self {
        Self {
            frame_index,
            track_id,
            vehicle_bbox,
            plate_bbox,
            recognition,
            origin: Origin::Observed,
        }
    }

    pub fn synthetic(
        frame_index: u32,
        track_id: i32,
        vehicle_bbox: BBox<Ltrb>,
        plate_bbox: BBox<Ltrb>,
    ) -> Self {
        Self {
            frame_index,
            track_id,
            vehicle_bbox,
            plate_bbox,
            recognition: Recognition::sentinel(),
            origin: Origin::Synthetic,
        }
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.origin == Origin::Synthetic
    }

    #[inline]
    pub fn text_score(&self) -> Option<f64> {
        self.recognition.text_score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_carries_sentinels() {
        let rec = DetectionRecord::synthetic(
            4,
            7,
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
        );

        assert!(rec.is_synthetic());
        assert!(rec.recognition.is_sentinel());
        assert_eq!(rec.text_score(), Some(0.0));
    }

    #[test]
    fn test_score_parsing() {
        assert_eq!(parse_score("0.95"), Some(0.95));
        assert_eq!(parse_score(" 0.5 "), Some(0.5));
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("n/a"), None);
        assert_eq!(parse_score("nan"), None);
        assert_eq!(parse_score("inf"), None);
    }
}
