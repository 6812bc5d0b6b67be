pub mod bbox;
pub mod best;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod interpolate;
pub mod math;
pub mod perception;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod store;
pub mod video;

mod track;

pub use bbox::{BBox, Ltrb, Ltwh};
pub use best::{select_best, BestRecords};
pub use config::Config;
pub use detection::{Detection, TrackedVehicle};
pub use error::Error;
pub use interpolate::interpolate;
pub use pipeline::{Outcome, Pipeline, Summary};
pub use record::{DetectionRecord, Origin, Recognition};
pub use render::OverlayRenderer;
pub use store::{Loaded, RecordStore, RejectedRow};
pub use track::Track;
