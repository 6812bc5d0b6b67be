use crate::record::DetectionRecord;
use crate::store::RecordStore;
use std::collections::HashMap;

/// Records grouped by frame, built once for replaying a video.
pub struct FrameIndex<'a> {
    frames: HashMap<u32, Vec<&'a DetectionRecord>>,
}

impl<'a> FrameIndex<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        let mut frames: HashMap<u32, Vec<&'a DetectionRecord>> = HashMap::new();
        for rec in store.iter() {
            frames.entry(rec.frame_index).or_default().push(rec);
        }

        Self { frames }
    }

    /// Records of `frame_index` in store order, empty when nothing was tracked there.
    #[inline]
    pub fn get(&self, frame_index: u32) -> &[&'a DetectionRecord] {
        self.frames
            .get(&frame_index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
