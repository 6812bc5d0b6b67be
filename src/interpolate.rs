//! Gap filling for tracks with missing frames.
//!
//! Each track is densified on its own: every integer frame between its first
//! and last observation gets exactly one record. Observed frames are copied
//! as-is; missing frames get boxes interpolated linearly between the two
//! nearest observations and sentinel recognition fields.

use crate::record::DetectionRecord;
use crate::store::RecordStore;
use crate::track::Track;

use tracing::{debug, info, warn};

/// Densifies every track of `store` into a new store, ordered by track id then frame.
pub fn interpolate(store: &RecordStore) -> RecordStore {
    let mut out = Vec::with_capacity(store.len());

    for track in store.tracks() {
        out.extend(interpolate_track(&track));
    }

    let synthetic = out.iter().filter(|r| r.is_synthetic()).count();
    info!(
        "Interpolated {} records into {} ({} synthetic)",
        store.len(),
        out.len(),
        synthetic
    );

    RecordStore::new(out)
}

pub fn interpolate_track(track: &Track<'_>) -> Vec<DetectionRecord> {
    let mut anchors: Vec<&DetectionRecord> = Vec::with_capacity(track.len());
    for rec in track.iter() {
        match anchors.last() {
            Some(prev) if prev.frame_index == rec.frame_index => {
                warn!(
                    "Track {}: duplicate observation at frame {}, keeping the first",
                    track.track_id, rec.frame_index
                );
            }
            _ => anchors.push(rec),
        }
    }

    let (first, last) = match (anchors.first(), anchors.last()) {
        (Some(first), Some(last)) => (first.frame_index, last.frame_index),
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity((last - first + 1) as usize);
    out.push(anchors[0].clone());

    for pair in anchors.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let gap = cur.frame_index - prev.frame_index;

        if gap > 1 {
            debug!(
                "Track {}: filling {} frames between {} and {}",
                track.track_id,
                gap - 1,
                prev.frame_index,
                cur.frame_index
            );
        }

        for k in 1..gap {
            let t = k as f64 / gap as f64;

            out.push(DetectionRecord::synthetic(
                prev.frame_index + k,
                track.track_id,
                prev.vehicle_bbox.interpolate(&cur.vehicle_bbox, t),
                prev.plate_bbox.interpolate(&cur.plate_bbox, t),
            ));
        }

        out.push(cur.clone());
    }

    debug_assert!(out
        .iter()
        .enumerate()
        .all(|(i, r)| r.frame_index == first + i as u32));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::record::{Origin, Recognition};
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    fn observed(frame: u32, track: i32, vehicle: [f64; 4], plate: [f64; 4], score: &str) -> DetectionRecord {
        DetectionRecord::observed(
            frame,
            track,
            BBox::assigned(&vehicle),
            BBox::assigned(&plate),
            Recognition {
                plate_bbox_score: "0.8".to_string(),
                plate_text: "ABC123".to_string(),
                plate_text_score: score.to_string(),
                plate_color: "White".to_string(),
            },
        )
    }

    #[test]
    fn test_fills_gap_with_sentinel_records() {
        let store = RecordStore::new(vec![
            observed(10, 3, [0.0, 0.0, 10.0, 10.0], [1.0, 1.0, 2.0, 2.0], "0.90"),
            observed(13, 3, [0.0, 0.0, 40.0, 40.0], [4.0, 4.0, 8.0, 8.0], "0.95"),
        ]);

        let dense = interpolate(&store);
        let recs = dense.records();

        assert_eq!(
            recs.iter().map(|r| r.frame_index).collect::<Vec<_>>(),
            vec![10, 11, 12, 13]
        );

        assert_relative_eq!(recs[1].vehicle_bbox.right(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(recs[1].vehicle_bbox.bottom(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(recs[2].vehicle_bbox.right(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(recs[2].plate_bbox.left(), 3.0, epsilon = 1e-9);

        assert!(recs[1].recognition.is_sentinel());
        assert!(recs[2].recognition.is_sentinel());
        assert_eq!(recs[1].origin, Origin::Synthetic);

        assert_eq!(recs[0], store.records()[0]);
        assert_eq!(recs[3], store.records()[1]);
        assert_eq!(recs[3].recognition.plate_text, "ABC123");
    }

    #[test]
    fn test_interpolation_is_exact_for_all_coordinates() {
        let b1 = [100.0, 50.0, 300.0, 250.0];
        let b2 = [160.0, 20.0, 390.0, 310.0];
        let p1 = [150.0, 200.0, 210.0, 230.0];
        let p2 = [210.0, 190.0, 290.0, 240.0];
        let (f1, f2) = (4u32, 11u32);

        let store = RecordStore::new(vec![
            observed(f1, 1, b1, p1, "0.5"),
            observed(f2, 1, b2, p2, "0.6"),
        ]);
        let dense = interpolate(&store);
        let g = (f2 - f1) as f64;

        for rec in dense.iter().filter(|r| r.is_synthetic()) {
            let t = (rec.frame_index - f1) as f64 / g;
            for i in 0..4 {
                assert_relative_eq!(
                    rec.vehicle_bbox.as_slice()[i],
                    b1[i] + t * (b2[i] - b1[i]),
                    epsilon = 1e-9
                );
                assert_relative_eq!(
                    rec.plate_bbox.as_slice()[i],
                    p1[i] + t * (p2[i] - p1[i]),
                    epsilon = 1e-9
                );
            }
        }

        assert_eq!(dense.iter().filter(|r| r.is_synthetic()).count(), 6);
    }

    #[test]
    fn test_each_gap_uses_nearest_neighbours() {
        let store = RecordStore::new(vec![
            observed(0, 1, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(2, 1, [0.0, 0.0, 30.0, 10.0], [0.0; 4], "0.1"),
            observed(4, 1, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
        ]);
        let dense = interpolate(&store);

        assert_relative_eq!(dense.records()[1].vehicle_bbox.right(), 20.0);
        assert_relative_eq!(dense.records()[3].vehicle_bbox.right(), 20.0);
    }

    #[test]
    fn test_no_gaps_and_interleaved_tracks() {
        let store = RecordStore::new(vec![
            observed(5, 2, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(1, 9, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(8, 2, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(4, 9, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(6, 9, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
        ]);
        let dense = interpolate(&store);

        for track in dense.tracks() {
            let frames: BTreeSet<u32> = track.iter().map(|r| r.frame_index).collect();
            let expected: BTreeSet<u32> =
                (track.first_frame().unwrap()..=track.last_frame().unwrap()).collect();

            assert_eq!(frames, expected);
            assert_eq!(frames.len(), track.len());
        }

        assert_eq!(dense.len(), 4 + 6);
    }

    #[test]
    fn test_single_and_contiguous_tracks_unchanged() {
        let single = observed(7, 1, [1.0, 2.0, 3.0, 4.0], [0.0; 4], "0.3");
        let store = RecordStore::new(vec![single.clone()]);
        assert_eq!(interpolate(&store).records(), &[single]);

        let contiguous = vec![
            observed(1, 4, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(2, 4, [0.0, 0.0, 11.0, 10.0], [0.0; 4], "0.2"),
            observed(3, 4, [0.0, 0.0, 12.0, 10.0], [0.0; 4], "0.3"),
        ];
        let store = RecordStore::new(contiguous.clone());
        assert_eq!(interpolate(&store).into_records(), contiguous);
    }

    #[test]
    fn test_unsorted_input_and_duplicates() {
        let store = RecordStore::new(vec![
            observed(3, 1, [0.0, 0.0, 30.0, 10.0], [0.0; 4], "0.3"),
            observed(1, 1, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(1, 1, [0.0, 0.0, 99.0, 10.0], [0.0; 4], "0.9"),
        ]);
        let dense = interpolate(&store);

        assert_eq!(dense.len(), 3);
        assert_eq!(dense.records()[0].text_score(), Some(0.1));
        assert_relative_eq!(dense.records()[1].vehicle_bbox.right(), 20.0);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let store = RecordStore::new(vec![
            observed(0, 1, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
            observed(5, 1, [0.0, 0.0, 10.0, 10.0], [0.0; 4], "0.1"),
        ]);
        let before = store.clone();
        let _ = interpolate(&store);

        assert_eq!(store, before);
    }
}
