//! Frame-level access to the source video and the annotated output.
//!
//! Rendering talks to [`FrameSource`] and [`FrameSink`] only; the OpenCV
//! backed [`VideoReader`] and [`VideoWriter`] release their handles on drop so
//! every exit path closes them.

use crate::error::Error;

use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio,
};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    pub frame_count: i32,
}

pub trait FrameSource {
    fn properties(&self) -> VideoProperties;

    /// Positions the stream so that the next `read` decodes `frame_index`.
    fn seek(&mut self, frame_index: u32) -> Result<(), Error>;

    /// Decodes the next frame into `frame`, `false` once the stream is over.
    fn read(&mut self, frame: &mut Mat) -> Result<bool, Error>;
}

pub trait FrameSink {
    fn write(&mut self, frame: &Mat) -> Result<(), Error>;

    /// Finalizes the output; further writes are an error.
    fn release(&mut self) -> Result<(), Error>;
}

pub struct VideoReader {
    cap: videoio::VideoCapture,
    props: VideoProperties,
}

impl VideoReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let open_err = || Error::SourceOpen {
            path: path.display().to_string(),
        };

        info!("Opening video: {}", path.display());

        let cap = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            .map_err(|_| open_err())?;

        if !cap.is_opened()? {
            return Err(open_err());
        }

        let props = VideoProperties {
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32,
            fps: cap.get(videoio::CAP_PROP_FPS)?,
            frame_count: cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i32,
        };

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            props.width, props.height, props.fps, props.frame_count
        );

        Ok(Self { cap, props })
    }
}

impl FrameSource for VideoReader {
    #[inline]
    fn properties(&self) -> VideoProperties {
        self.props
    }

    fn seek(&mut self, frame_index: u32) -> Result<(), Error> {
        if !self
            .cap
            .set(videoio::CAP_PROP_POS_FRAMES, frame_index as f64)?
        {
            return Err(Error::FrameSeek { frame_index });
        }

        Ok(())
    }

    fn read(&mut self, frame: &mut Mat) -> Result<bool, Error> {
        if !self.cap.read(frame)? {
            return Ok(false);
        }

        Ok(frame.rows() > 0 && frame.cols() > 0)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        if let Err(err) = self.cap.release() {
            warn!("Failed to release video capture: {}", err);
        }
    }
}

/// Writer opened lazily on the first frame so the output takes the exact
/// resolution of what is fed to it.
pub struct VideoWriter {
    writer: Option<videoio::VideoWriter>,
    out_file: String,
    fourcc: i32,
    fps: f64,
    frames: usize,
    released: bool,
}

impl VideoWriter {
    pub fn new<P: AsRef<Path>>(out_file: P, fourcc: &str, fps: f64) -> Result<Self, Error> {
        let out_file = out_file.as_ref();
        let code: Vec<char> = fourcc.chars().collect();

        let fourcc = match code.as_slice() {
            &[a, b, c, d] => videoio::VideoWriter::fourcc(a, b, c, d)?,
            _ => {
                return Err(Error::MalformedField {
                    column: "fourcc",
                    value: fourcc.to_string(),
                })
            }
        };

        if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            writer: None,
            out_file: out_file.display().to_string(),
            fourcc,
            fps,
            frames: 0,
            released: false,
        })
    }

    #[inline]
    pub fn frames_written(&self) -> usize {
        self.frames
    }

    fn init(&mut self, size: (i32, i32)) -> Result<(), Error> {
        debug!("Creating {} at {}x{}", self.out_file, size.0, size.1);

        let writer = videoio::VideoWriter::new(
            &self.out_file,
            self.fourcc,
            self.fps,
            core::Size::new(size.0, size.1),
            true,
        )?;

        if !writer.is_opened()? {
            return Err(Error::SinkOpen {
                path: self.out_file.clone(),
            });
        }

        self.writer = Some(writer);

        Ok(())
    }
}

impl FrameSink for VideoWriter {
    fn write(&mut self, frame: &Mat) -> Result<(), Error> {
        if self.released {
            return Err(Error::SinkOpen {
                path: self.out_file.clone(),
            });
        }

        if self.writer.is_none() {
            self.init((frame.cols(), frame.rows()))?;
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.write(frame)?;
            self.frames += 1;
        }

        Ok(())
    }

    fn release(&mut self) -> Result<(), Error> {
        self.released = true;

        if let Some(mut w) = self.writer.take() {
            w.release()?;
            info!("Wrote {} frames to {}", self.frames, self.out_file);
        }

        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("Failed to release video writer: {}", err);
        }
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;

    /// Frames held in memory, for exercising rendering without a codec.
    pub struct MemorySource {
        pub frames: Vec<Mat>,
        pub pos: usize,
        pub fps: f64,
    }

    impl MemorySource {
        pub fn solid(count: usize, width: i32, height: i32, bgr: [f64; 3]) -> Self {
            let frames = (0..count)
                .map(|_| {
                    Mat::new_rows_cols_with_default(
                        height,
                        width,
                        core::CV_8UC3,
                        core::Scalar::new(bgr[0], bgr[1], bgr[2], 0.0),
                    )
                    .unwrap()
                })
                .collect();

            Self {
                frames,
                pos: 0,
                fps: 25.0,
            }
        }
    }

    impl FrameSource for MemorySource {
        fn properties(&self) -> VideoProperties {
            let (width, height) = self
                .frames
                .first()
                .map(|f| (f.cols(), f.rows()))
                .unwrap_or((0, 0));

            VideoProperties {
                width,
                height,
                fps: self.fps,
                frame_count: self.frames.len() as i32,
            }
        }

        fn seek(&mut self, frame_index: u32) -> Result<(), Error> {
            if frame_index as usize > self.frames.len() {
                return Err(Error::FrameSeek { frame_index });
            }

            self.pos = frame_index as usize;
            Ok(())
        }

        fn read(&mut self, frame: &mut Mat) -> Result<bool, Error> {
            match self.frames.get(self.pos) {
                Some(src) => {
                    *frame = src.try_clone()?;
                    self.pos += 1;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    #[derive(Default)]
    pub struct MemorySink {
        pub frames: Vec<Mat>,
        pub released: bool,
    }

    impl FrameSink for MemorySink {
        fn write(&mut self, frame: &Mat) -> Result<(), Error> {
            assert!(!self.released, "write after release");
            self.frames.push(frame.try_clone()?);
            Ok(())
        }

        fn release(&mut self) -> Result<(), Error> {
            self.released = true;
            Ok(())
        }
    }
}
