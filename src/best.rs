//! Reduces each track to its single highest-confidence plate reading.
//!
//! Both the best-record CSV and crop extraction go through [`select_best`],
//! so the two can never pick different rows for the same track.

use crate::error::Error;
use crate::record::DetectionRecord;
use crate::store::RecordStore;

use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct BestRecords {
    picks: BTreeMap<i32, DetectionRecord>,
    failures: Vec<Error>,
}

impl BestRecords {
    #[inline]
    pub fn get(&self, track_id: i32) -> Option<&DetectionRecord> {
        self.picks.get(&track_id)
    }

    /// Picks in ascending track id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.picks.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// One [`Error::UnscoreableTrack`] per track with no usable score.
    #[inline]
    pub fn failures(&self) -> &[Error] {
        &self.failures
    }

    pub fn to_store(&self) -> RecordStore {
        self.picks.values().cloned().collect()
    }
}

/// Picks, per track id, the first record (in store order) with the maximum
/// `license_number_score`. Records whose score does not parse are ignored.
pub fn select_best(store: &RecordStore) -> BestRecords {
    let mut best: BTreeMap<i32, Option<(f64, &DetectionRecord)>> = BTreeMap::new();

    for rec in store.iter() {
        let slot = best.entry(rec.track_id).or_insert(None);
        let score = match rec.text_score() {
            Some(score) => score,
            None => continue,
        };

        let better = match *slot {
            Some((top, _)) => score > top,
            None => true,
        };

        if better {
            *slot = Some((score, rec));
        }
    }

    let mut out = BestRecords::default();
    for (track_id, pick) in best {
        match pick {
            Some((_, rec)) => {
                out.picks.insert(track_id, rec.clone());
            }
            None => {
                let err = Error::UnscoreableTrack { track_id };
                warn!("{}", err);
                out.failures.push(err);
            }
        }
    }

    info!(
        "Selected best records for {} tracks ({} unscoreable)",
        out.picks.len(),
        out.failures.len()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::record::Recognition;

    fn rec(frame: u32, track: i32, text: &str, score: &str) -> DetectionRecord {
        DetectionRecord::observed(
            frame,
            track,
            BBox::ltrb(0.0, 0.0, 10.0, 10.0),
            BBox::ltrb(1.0, 1.0, 2.0, 2.0),
            Recognition {
                plate_bbox_score: "0.5".to_string(),
                plate_text: text.to_string(),
                plate_text_score: score.to_string(),
                plate_color: "0".to_string(),
            },
        )
    }

    #[test]
    fn test_one_pick_per_track_with_max_score() {
        let store = RecordStore::new(vec![
            rec(0, 1, "AAA", "0.2"),
            rec(0, 2, "BBB", "0.7"),
            rec(1, 1, "AAB", "0.9"),
            rec(1, 2, "BBC", "0.3"),
            rec(2, 1, "AAC", "0.4"),
        ]);
        let best = select_best(&store);

        assert_eq!(best.len(), 2);
        assert!(best.failures().is_empty());
        assert_eq!(best.get(1).unwrap().recognition.plate_text, "AAB");
        assert_eq!(best.get(2).unwrap().recognition.plate_text, "BBB");
    }

    #[test]
    fn test_tie_goes_to_earliest_record() {
        let store = RecordStore::new(vec![
            rec(4, 1, "FIRST", "0.8"),
            rec(2, 1, "LOW", "0.1"),
            rec(9, 1, "SECOND", "0.8"),
        ]);
        let best = select_best(&store);

        assert_eq!(best.get(1).unwrap().recognition.plate_text, "FIRST");
    }

    #[test]
    fn test_unparseable_scores_are_excluded_not_zeroed() {
        let store = RecordStore::new(vec![
            rec(0, 1, "NEG", "-0.5"),
            rec(1, 1, "BAD", "garbage"),
            rec(2, 1, "NAN", "nan"),
        ]);
        let best = select_best(&store);

        assert_eq!(best.get(1).unwrap().recognition.plate_text, "NEG");
    }

    #[test]
    fn test_unscoreable_track_reported() {
        let store = RecordStore::new(vec![
            rec(0, 1, "OK", "0.5"),
            rec(0, 5, "X", ""),
            rec(1, 5, "Y", "n/a"),
        ]);
        let best = select_best(&store);

        assert_eq!(best.len(), 1);
        assert_eq!(best.failures().len(), 1);
        assert!(matches!(
            best.failures()[0],
            Error::UnscoreableTrack { track_id: 5 }
        ));
        assert!(best.get(5).is_none());
    }

    #[test]
    fn test_to_store_in_track_order() {
        let store = RecordStore::new(vec![rec(0, 8, "B", "0.5"), rec(0, 3, "A", "0.5")]);
        let out = select_best(&store).to_store();

        assert_eq!(out.track_ids(), vec![3, 8]);
        assert_eq!(out.records()[0].track_id, 3);
    }
}
