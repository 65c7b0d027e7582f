//! Trained label encodings for the categorical columns

use std::collections::HashMap;

use crate::{CategoricalField, Result, YieldError};

/// Fixed category -> code mapping for one field.
///
/// Codes are positions in the class list the encoder was fit with, so every
/// code lies in `[0, len)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from the trained class list. Fails on an empty list or a
    /// repeated class, either of which would make codes ambiguous.
    pub fn from_classes(classes: Vec<String>) -> std::result::Result<Self, String> {
        if classes.is_empty() {
            return Err("vocabulary has no classes".to_string());
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code).is_some() {
                return Err(format!("duplicate class {:?}", class));
            }
        }

        Ok(Vocabulary { classes, index })
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn class(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Classes in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Encoder over the four categorical vocabularies
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalEncoder {
    region: Vocabulary,
    soil_type: Vocabulary,
    crop: Vocabulary,
    weather_condition: Vocabulary,
}

impl CategoricalEncoder {
    pub fn new(
        region: Vocabulary,
        soil_type: Vocabulary,
        crop: Vocabulary,
        weather_condition: Vocabulary,
    ) -> Self {
        CategoricalEncoder {
            region,
            soil_type,
            crop,
            weather_condition,
        }
    }

    pub fn vocabulary(&self, field: CategoricalField) -> &Vocabulary {
        match field {
            CategoricalField::Region => &self.region,
            CategoricalField::SoilType => &self.soil_type,
            CategoricalField::Crop => &self.crop,
            CategoricalField::WeatherCondition => &self.weather_condition,
        }
    }

    /// Look up the trained code for a category.
    ///
    /// Values outside the vocabulary are an error; there is no fallback code.
    pub fn encode(&self, field: CategoricalField, value: &str) -> Result<usize> {
        self.vocabulary(field)
            .code(value)
            .ok_or_else(|| YieldError::UnknownCategory {
                field,
                value: value.to_string(),
            })
    }

    pub fn decode(&self, field: CategoricalField, code: usize) -> Option<&str> {
        self.vocabulary(field).class(code)
    }

    pub fn categories(&self, field: CategoricalField) -> &[String] {
        self.vocabulary(field).classes()
    }
}
