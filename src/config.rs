use crate::error::Error;

use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub output: OutputConfig,
    pub perception: PerceptionConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

/// Colors are BGR, as OpenCV draws them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub vehicle_color: [f64; 3],
    pub vehicle_thickness: i32,
    pub corner_length_x: i32,
    pub corner_length_y: i32,
    pub plate_color: [f64; 3],
    pub plate_thickness: i32,
    /// Height every best-plate crop is resized to.
    pub crop_height: i32,
    /// Vertical distance between the crop bottom and the vehicle box top.
    pub panel_gap: i32,
    pub caption_height: i32,
    pub caption_background: [f64; 3],
    pub font_scale: f64,
    pub font_thickness: i32,
    pub text_color: [f64; 3],
    pub fourcc: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vehicle_color: [0.0, 255.0, 0.0],
            vehicle_thickness: 25,
            corner_length_x: 200,
            corner_length_y: 200,
            plate_color: [0.0, 0.0, 255.0],
            plate_thickness: 12,
            crop_height: 400,
            panel_gap: 100,
            caption_height: 300,
            caption_background: [255.0, 255.0, 255.0],
            font_scale: 4.3,
            font_thickness: 17,
            text_color: [0.0, 0.0, 0.0],
            fourcc: "avc1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub interpolated_csv: String,
    pub best_csv: String,
    pub video_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            interpolated_csv: "test_interpolated.csv".to_string(),
            best_csv: "final_csv.csv".to_string(),
            video_suffix: "_annotated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// COCO class ids kept as vehicles: car, motorbike, bus, truck.
    pub vehicle_classes: Vec<i32>,
    pub plate_threshold: u8,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            vehicle_classes: vec![2, 3, 5, 7],
            plate_threshold: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
render:
  vehicle_thickness: 8
  fourcc: mp4v
output:
  dir: results
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.render.vehicle_thickness, 8);
        assert_eq!(config.render.fourcc, "mp4v");
        assert_eq!(config.render.crop_height, 400);
        assert_eq!(config.render.font_scale, 4.3);
        assert_eq!(config.output.dir, "results");
        assert_eq!(config.output.best_csv, "final_csv.csv");
        assert_eq!(config.perception.vehicle_classes, vec![2, 3, 5, 7]);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config: Config = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.render.plate_thickness, 12);
        assert_eq!(config.render.caption_background, [255.0, 255.0, 255.0]);
    }
}
