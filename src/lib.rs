//! Crop yield prediction
//!
//! Turns raw field observations into the fixed feature vector a trained
//! nearest-neighbor regressor expects, and maps its scaled output back to a
//! real-world yield.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Categorical input columns, each with its own trained vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalField {
    Region,
    SoilType,
    Crop,
    WeatherCondition,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::Region,
        CategoricalField::SoilType,
        CategoricalField::Crop,
        CategoricalField::WeatherCondition,
    ];

    /// Column name used when the encoders were fit
    pub fn column_name(&self) -> &'static str {
        match self {
            CategoricalField::Region => "Region",
            CategoricalField::SoilType => "Soil_Type",
            CategoricalField::Crop => "Crop",
            CategoricalField::WeatherCondition => "Weather_Condition",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', ' '], "_").as_str() {
            "region" => Some(CategoricalField::Region),
            "soil_type" | "soil" => Some(CategoricalField::SoilType),
            "crop" => Some(CategoricalField::Crop),
            "weather_condition" | "weather" => Some(CategoricalField::WeatherCondition),
            _ => None,
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// One prediction request, exactly as entered.
///
/// Continuous fields stay as strings until assembly so that parse failures
/// surface as [`YieldError::MalformedInput`] from the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Soil_Type")]
    pub soil_type: String,
    #[serde(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Rainfall_mm", deserialize_with = "de_numeric_string")]
    pub rainfall_mm: String,
    #[serde(rename = "Temperature_Celsius", deserialize_with = "de_numeric_string")]
    pub temperature_celsius: String,
    #[serde(rename = "Fertilizer_Used")]
    pub fertilizer_used: String,
    #[serde(rename = "Irrigation_Used")]
    pub irrigation_used: String,
    #[serde(rename = "Weather_Condition")]
    pub weather_condition: String,
}

impl RawInput {
    pub fn categorical(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Region => &self.region,
            CategoricalField::SoilType => &self.soil_type,
            CategoricalField::Crop => &self.crop,
            CategoricalField::WeatherCondition => &self.weather_condition,
        }
    }
}

// Batch files may carry the continuous columns as JSON numbers or strings
fn de_numeric_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(serde_json::Number),
        Str(String),
    }

    Ok(match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => n.to_string(),
        NumOrStr::Str(s) => s,
    })
}

/// Pipeline output for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Yield in real units, rounded to two decimal places
    pub yield_value: f64,
    /// Yield in real units before rounding
    pub raw_yield: f64,
    /// Regressor output in the scaler's normalized space
    pub normalized_yield: f64,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum YieldError {
    #[error("Unknown category for {field}: {value:?}")]
    UnknownCategory {
        field: CategoricalField,
        value: String,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Failed to load artifact {path}: {message}")]
    ArtifactLoad { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, YieldError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding the encoder, scaler and model files
    pub dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: table, json or csv
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            artifacts: ArtifactsConfig {
                dir: "models".to_string(),
            },
            output: OutputConfig {
                format: "table".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            YieldError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| YieldError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| YieldError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
