use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed bbox {value:?}: expected exactly 4 numeric values")]
    MalformedBox { value: String },

    #[error("malformed value {value:?} in column `{column}`")]
    MalformedField { column: &'static str, value: String },

    #[error("track {track_id} has no parseable license_number_score")]
    UnscoreableTrack { track_id: i32 },

    #[error("unable to decode frame {frame_index}")]
    FrameSeek { frame_index: u32 },

    #[error("unable to open source video {path}")]
    SourceOpen { path: String },

    #[error("unable to open output video {path}")]
    SinkOpen { path: String },

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    #[error("OpenCV Error: {0}")]
    OpenCvError(#[from] opencv::Error),
}
