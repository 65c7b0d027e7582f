//! Feature vector assembly
//!
//! Each request is encoded as the fixed eight-column vector the regressor
//! was trained on.

use crate::features::encoding::CategoricalEncoder;
use crate::features::scaling::FeatureScaler;
use crate::{CategoricalField, RawInput, Result, YieldError};

/// Model input in trained column order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub region_code: f64,
    pub soil_code: f64,
    pub crop_code: f64,
    /// Min-max scaled rainfall (not clamped)
    pub rainfall_norm: f64,
    /// Min-max scaled temperature (not clamped)
    pub temperature_norm: f64,
    /// 1.0 only for an exact "Yes"
    pub fertilizer_bit: f64,
    /// 1.0 only for an exact "Yes"
    pub irrigation_bit: f64,
    pub weather_code: f64,
}

impl FeatureVector {
    /// Dimension of feature vector
    pub const DIM: usize = 8;

    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.region_code,
            self.soil_code,
            self.crop_code,
            self.rainfall_norm,
            self.temperature_norm,
            self.fertilizer_bit,
            self.irrigation_bit,
            self.weather_code,
        ]
    }

    pub fn from_slice(v: &[f64]) -> Result<Self> {
        if v.len() != Self::DIM {
            return Err(YieldError::MalformedInput(format!(
                "feature vector has {} elements, expected {}",
                v.len(),
                Self::DIM
            )));
        }
        Ok(FeatureVector {
            region_code: v[0],
            soil_code: v[1],
            crop_code: v[2],
            rainfall_norm: v[3],
            temperature_norm: v[4],
            fertilizer_bit: v[5],
            irrigation_bit: v[6],
            weather_code: v[7],
        })
    }
}

/// Strict Yes/No flag: only the exact string "Yes" is set
pub fn yes_bit(value: &str) -> f64 {
    if value == "Yes" {
        1.0
    } else {
        0.0
    }
}

fn parse_continuous(name: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        YieldError::MalformedInput(format!("{} is not a number: {:?}", name, value))
    })?;
    if !parsed.is_finite() {
        return Err(YieldError::MalformedInput(format!(
            "{} must be finite, got {:?}",
            name, value
        )));
    }
    Ok(parsed)
}

/// Builds feature vectors from raw requests
#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler<'a> {
    encoder: &'a CategoricalEncoder,
    scaler: &'a FeatureScaler,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(encoder: &'a CategoricalEncoder, scaler: &'a FeatureScaler) -> Self {
        FeatureAssembler { encoder, scaler }
    }

    pub fn assemble(&self, input: &RawInput) -> Result<FeatureVector> {
        let code = |field: CategoricalField| -> Result<f64> {
            Ok(self.encoder.encode(field, input.categorical(field))? as f64)
        };

        let region_code = code(CategoricalField::Region)?;
        let soil_code = code(CategoricalField::SoilType)?;
        let crop_code = code(CategoricalField::Crop)?;
        let weather_code = code(CategoricalField::WeatherCondition)?;

        let rainfall = parse_continuous("Rainfall_mm", &input.rainfall_mm)?;
        let temperature = parse_continuous("Temperature_Celsius", &input.temperature_celsius)?;
        let (rainfall_norm, temperature_norm) = self.scaler.normalize_inputs(rainfall, temperature);

        let vector = FeatureVector {
            region_code,
            soil_code,
            crop_code,
            rainfall_norm,
            temperature_norm,
            fertilizer_bit: yes_bit(&input.fertilizer_used),
            irrigation_bit: yes_bit(&input.irrigation_used),
            weather_code,
        };
        log::debug!("Assembled features {:?}", vector.to_array());
        Ok(vector)
    }
}
