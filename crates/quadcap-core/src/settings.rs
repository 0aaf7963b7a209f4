//! YAML settings for the capture tools.
//!
//! Keys are read by name, several of them containing spaces:
//!
//! ```yaml
//! path: ./captures/
//! positions file name: route.csv
//! extension: .png
//! vision sensor names: [Vision_sensor]
//! quadcopter name: /target
//! quadcopter base: /Quadcopter/base
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::control::ControlConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("settings list `vision sensor names` is empty")]
    NoVisionSensor,
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read any YAML file into a key-value mapping.
pub fn load_mapping(path: impl AsRef<Path>) -> Result<serde_yaml::Mapping, SettingsError> {
    let contents = read_settings_file(path.as_ref())?;
    Ok(serde_yaml::from_str(&contents)?)
}

fn read_settings_file(path: &Path) -> Result<String, SettingsError> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.to_path_buf()));
    }
    info!("Using settings: {}", path.display());
    Ok(fs::read_to_string(path)?)
}

/// Settings consumed by the image capture tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Directory that receives the captured images
    pub path: PathBuf,
    /// CSV route file to follow
    #[serde(rename = "positions file name")]
    pub positions_file: PathBuf,
    /// Image file extension, e.g. `.png`
    pub extension: String,
    /// Vision sensors in the scene; the first one is captured
    #[serde(rename = "vision sensor names")]
    pub vision_sensor_names: Vec<String>,
    /// Target dummy the quadcopter controller follows
    #[serde(rename = "quadcopter name")]
    pub quadcopter_name: String,
    /// Quadcopter body whose pose is measured
    #[serde(rename = "quadcopter base")]
    pub quadcopter_base: String,
    #[serde(rename = "image prefix", default = "default_image_prefix")]
    pub image_prefix: String,
    /// Lowest Z a waypoint may command, in meters
    #[serde(rename = "min altitude", default = "default_min_altitude")]
    pub min_altitude: f64,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub control: ControlConfig,
}

fn default_image_prefix() -> String {
    "reconstruct_image_".to_string()
}

fn default_min_altitude() -> f64 {
    0.16
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    23000
}

impl CaptureSettings {
    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = read_settings_file(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, SettingsError> {
        let settings: CaptureSettings = serde_yaml::from_str(contents)?;
        if settings.vision_sensor_names.is_empty() {
            return Err(SettingsError::NoVisionSensor);
        }
        Ok(settings)
    }

    /// Replace the output folder and route file, as given on the command line.
    pub fn apply_overrides(&mut self, folder: impl Into<PathBuf>, positions_file: impl Into<PathBuf>) {
        self.path = folder.into();
        self.positions_file = positions_file.into();
    }

    /// First configured vision sensor. `None` if the list was emptied after load.
    pub fn vision_sensor_name(&self) -> Option<&str> {
        self.vision_sensor_names.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
path: ./captures/
positions file name: route.csv
extension: .png
vision sensor names:
  - Vision_sensor
  - Vision_sensor_rear
quadcopter name: /target
quadcopter base: /Quadcopter/base
"#;

    #[test]
    fn test_deserialize_minimal_settings() {
        let settings = CaptureSettings::from_yaml_str(MINIMAL).unwrap();

        assert_eq!(settings.path, PathBuf::from("./captures/"));
        assert_eq!(settings.positions_file, PathBuf::from("route.csv"));
        assert_eq!(settings.vision_sensor_name(), Some("Vision_sensor"));
        assert_eq!(settings.quadcopter_base, "/Quadcopter/base");
        assert_eq!(settings.image_prefix, "reconstruct_image_");
        assert_eq!(settings.min_altitude, 0.16);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 23000);
        assert_eq!(settings.control.position_tolerance, 0.05);
    }

    #[test]
    fn test_control_overrides_merge_with_defaults() {
        let yaml = format!("{MINIMAL}control:\n  max_settle_steps: 500\n  position_tolerance: 0.01\n");
        let settings = CaptureSettings::from_yaml_str(&yaml).unwrap();

        assert_eq!(settings.control.max_settle_steps, Some(500));
        assert_eq!(settings.control.position_tolerance, 0.01);
        assert_eq!(settings.control.orientation_tolerance, 0.02);
    }

    #[test]
    fn test_empty_vision_sensor_list_rejected() {
        let yaml = MINIMAL.replace(
            "vision sensor names:\n  - Vision_sensor\n  - Vision_sensor_rear\n",
            "vision sensor names: []\n",
        );
        let err = CaptureSettings::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, SettingsError::NoVisionSensor));
    }

    #[test]
    fn test_sensor_name_without_sensors() {
        // Deserializing directly skips the load-time check.
        let yaml = MINIMAL.replace("  - Vision_sensor\n  - Vision_sensor_rear\n", "  []\n");
        let settings: CaptureSettings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(settings.vision_sensor_name(), None);

        let mut settings = CaptureSettings::from_yaml_str(MINIMAL).unwrap();
        settings.vision_sensor_names.clear();
        assert_eq!(settings.vision_sensor_name(), None);
    }

    #[test]
    fn test_apply_overrides() {
        let mut settings = CaptureSettings::from_yaml_str(MINIMAL).unwrap();
        settings.apply_overrides("/tmp/out", "office.csv");

        assert_eq!(settings.path, PathBuf::from("/tmp/out"));
        assert_eq!(settings.positions_file, PathBuf::from("office.csv"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.yaml");

        assert!(matches!(load_mapping(&missing), Err(SettingsError::NotFound(_))));
        assert!(matches!(
            CaptureSettings::from_yaml_file(&missing),
            Err(SettingsError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_mapping_keeps_arbitrary_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");
        fs::write(&file, "extension: .jpg\nsomething else: 3\n").unwrap();

        let mapping = load_mapping(&file).unwrap();
        assert_eq!(mapping.get("extension").and_then(|v| v.as_str()), Some(".jpg"));
        assert_eq!(mapping.get("something else").and_then(|v| v.as_u64()), Some(3));
    }
}
