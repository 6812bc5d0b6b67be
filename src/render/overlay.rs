//! Drawing primitives and panel geometry for per-track annotations.

use crate::bbox::{BBox, Ltrb};
use crate::config::RenderConfig;

use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

#[inline]
pub fn scalar(bgr: [f64; 3]) -> core::Scalar {
    core::Scalar::new(bgr[0], bgr[1], bgr[2], 0.0)
}

/// Placement of the best-plate panel above a vehicle: the crop sits right
/// above the gap, the caption area right above the crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub crop: core::Rect,
    pub caption: core::Rect,
}

impl PanelLayout {
    pub fn above(vehicle: &BBox<Ltrb>, crop_size: core::Size, config: &RenderConfig) -> Self {
        let left = ((vehicle.left() + vehicle.right() - crop_size.width as f64) / 2.0) as i32;
        let crop_top = (vehicle.top() as i32)
            .saturating_sub(config.panel_gap)
            .saturating_sub(crop_size.height);

        Self {
            crop: core::Rect::new(left, crop_top, crop_size.width, crop_size.height),
            caption: core::Rect::new(
                left,
                crop_top.saturating_sub(config.caption_height),
                crop_size.width,
                config.caption_height,
            ),
        }
    }

    #[inline]
    pub fn fits(&self, frame_size: core::Size) -> bool {
        fits(self.crop, frame_size) && fits(self.caption, frame_size)
    }
}

/// Non-empty and fully inside a `frame_size` image. Extents are summed in
/// `i64` so rects at the edge of the `i32` range never fit.
#[inline]
pub fn fits(rect: core::Rect, frame_size: core::Size) -> bool {
    rect.width > 0
        && rect.height > 0
        && rect.x >= 0
        && rect.y >= 0
        && rect.x as i64 + rect.width as i64 <= frame_size.width as i64
        && rect.y as i64 + rect.height as i64 <= frame_size.height as i64
}

/// `bbox` truncated to whole pixels and clipped to the frame, `None` when
/// nothing is left.
pub fn clip_rect(bbox: &BBox<Ltrb>, frame_size: core::Size) -> Option<core::Rect> {
    let x1 = (bbox.left() as i32).clamp(0, frame_size.width);
    let y1 = (bbox.top() as i32).clamp(0, frame_size.height);
    let x2 = (bbox.right() as i32).clamp(0, frame_size.width);
    let y2 = (bbox.bottom() as i32).clamp(0, frame_size.height);

    let rect = core::Rect::new(x1, y1, x2 - x1, y2 - y1);
    fits(rect, frame_size).then_some(rect)
}

/// Four L-shaped marks at the corners of `bbox`.
pub fn draw_corner_brackets(
    frame: &mut Mat,
    bbox: &BBox<Ltrb>,
    color: core::Scalar,
    thickness: i32,
    length_x: i32,
    length_y: i32,
) -> opencv::Result<()> {
    let (x1, y1) = (bbox.left() as i32, bbox.top() as i32);
    let (x2, y2) = (bbox.right() as i32, bbox.bottom() as i32);

    let marks = [
        // top-left
        ((x1, y1), (x1, y1.saturating_add(length_y))),
        ((x1, y1), (x1.saturating_add(length_x), y1)),
        // bottom-left
        ((x1, y2), (x1, y2.saturating_sub(length_y))),
        ((x1, y2), (x1.saturating_add(length_x), y2)),
        // top-right
        ((x2, y1), (x2.saturating_sub(length_x), y1)),
        ((x2, y1), (x2, y1.saturating_add(length_y))),
        // bottom-right
        ((x2, y2), (x2, y2.saturating_sub(length_y))),
        ((x2, y2), (x2.saturating_sub(length_x), y2)),
    ];

    for ((ax, ay), (bx, by)) in marks {
        imgproc::line(
            frame,
            core::Point::new(ax, ay),
            core::Point::new(bx, by),
            color,
            thickness,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}

pub fn draw_box(
    frame: &mut Mat,
    bbox: &BBox<Ltrb>,
    color: core::Scalar,
    thickness: i32,
) -> opencv::Result<()> {
    let ltwh = bbox.as_ltwh();
    let rect = core::Rect::new(
        ltwh.left() as i32,
        ltwh.top() as i32,
        ltwh.width() as i32,
        ltwh.height() as i32,
    );

    imgproc::rectangle(frame, rect, color, thickness, imgproc::LINE_8, 0)
}

/// Draws the crop, the caption background and the centered caption text.
/// The caller checks that `layout` fits the frame.
pub fn draw_panel(
    frame: &mut Mat,
    layout: &PanelLayout,
    crop: &Mat,
    text: &str,
    config: &RenderConfig,
) -> opencv::Result<()> {
    paste(frame, crop, layout.crop.x, layout.crop.y)?;

    imgproc::rectangle(
        frame,
        layout.caption,
        scalar(config.caption_background),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;

    let mut base_line = 0;
    let text_size = imgproc::get_text_size(
        text,
        imgproc::FONT_HERSHEY_SIMPLEX,
        config.font_scale,
        config.font_thickness,
        &mut base_line,
    )?;

    let org = core::Point::new(
        layout.caption.x + (layout.caption.width - text_size.width) / 2,
        layout.caption.y + layout.caption.height / 2 + text_size.height / 2,
    );

    imgproc::put_text(
        frame,
        text,
        org,
        imgproc::FONT_HERSHEY_SIMPLEX,
        config.font_scale,
        scalar(config.text_color),
        config.font_thickness,
        imgproc::LINE_8,
        false,
    )
}

fn out_of_range(what: &str) -> opencv::Error {
    opencv::Error::new(core::StsOutOfRange, format!("{} outside of image", what))
}

/// Copies `image` into `frame` with its top-left corner at `(x, y)`.
pub fn paste(frame: &mut Mat, image: &Mat, x: i32, y: i32) -> opencv::Result<()> {
    let rect = core::Rect::new(x, y, image.cols(), image.rows());
    if !fits(rect, core::Size::new(frame.cols(), frame.rows())) {
        return Err(out_of_range("paste region"));
    }

    let mut roi = Mat::roi_mut(frame, rect)?;
    image.copy_to(&mut *roi)
}

/// Copies the `rect` region of `frame` into a new image.
pub fn crop_region(frame: &Mat, rect: core::Rect) -> opencv::Result<Mat> {
    if !fits(rect, core::Size::new(frame.cols(), frame.rows())) {
        return Err(out_of_range("crop region"));
    }

    Mat::roi(frame, rect)?.try_clone()
}
