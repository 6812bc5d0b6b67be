use crate::bbox::{BBox, Ltrb};

/// Detector output: corners of the box, its score and the class id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub class: i32,
}

impl Detection {
    pub fn new(bbox: BBox<Ltrb>, confidence: f64, class: i32) -> Self {
        let [x1, y1, x2, y2] = *bbox.as_slice();
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltrb> {
        BBox::ltrb(self.x1, self.y1, self.x2, self.y2)
    }
}

/// Tracker output: a vehicle box carrying its persistent id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub track_id: i32,
}

impl TrackedVehicle {
    pub fn new(bbox: BBox<Ltrb>, track_id: i32) -> Self {
        let [x1, y1, x2, y2] = *bbox.as_slice();
        Self {
            x1,
            y1,
            x2,
            y2,
            track_id,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltrb> {
        BBox::ltrb(self.x1, self.y1, self.x2, self.y2)
    }
}
