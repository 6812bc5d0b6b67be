use crate::record::DetectionRecord;

/// Records sharing one tracker id, ordered by frame.
#[derive(Debug, Clone)]
pub struct Track<'a> {
    pub track_id: i32,
    pub records: Vec<&'a DetectionRecord>,
}

impl<'a> Track<'a> {
    /// Builds a track from records in store order; the sort is stable so equal
    /// frames keep their relative order.
    pub fn new(track_id: i32, mut records: Vec<&'a DetectionRecord>) -> Self {
        records.sort_by_key(|r| r.frame_index);

        Self { track_id, records }
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
    pub fn first_frame(&self) -> Option<u32> {
        self.records.first().map(|r| r.frame_index)
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u32> {
        self.records.last().map(|r| r.frame_index)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'a DetectionRecord> + '_ {
        self.records.iter().copied()
    }

    /// True when every integer frame of the lifetime has exactly one record.
    pub fn is_contiguous(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| w[1].frame_index == w[0].frame_index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn rec(frame: u32) -> DetectionRecord {
        DetectionRecord::synthetic(
            frame,
            1,
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
        )
    }

    #[test]
    fn test_track_sorted_and_bounds() {
        let recs = vec![rec(5), rec(3), rec(4)];
        let track = Track::new(1, recs.iter().collect());

        assert_eq!(track.first_frame(), Some(3));
        assert_eq!(track.last_frame(), Some(5));
        assert!(track.is_contiguous());
    }

    #[test]
    fn test_track_with_gap() {
        let recs = vec![rec(1), rec(4)];
        let track = Track::new(1, recs.iter().collect());

        assert!(!track.is_contiguous());
        assert_eq!(track.len(), 2);
    }
}
