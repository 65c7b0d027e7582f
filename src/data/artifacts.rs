//! Loading of the trained artifacts
//!
//! Each fitted object lives in its own JSON file inside the artifact
//! directory, named after the column it was fit on.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::features::{CategoricalEncoder, ColumnRange, FeatureScaler, ScalerColumn, Vocabulary};
use crate::model::KnnRegressor;
use crate::{CategoricalField, Result, YieldError};

pub const SCALER_FILE: &str = "minmax_scaler.json";
pub const MODEL_FILE: &str = "knn.json";

/// File name of the label encoder for a field
pub fn encoder_file(field: CategoricalField) -> String {
    format!("le_{}.json", field.column_name())
}

/// On-disk label encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderFile {
    pub classes: Vec<String>,
}

/// On-disk min-max scaler, columns ordered rainfall, temperature, yield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerFile {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

/// On-disk nearest-neighbor model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub n_neighbors: usize,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

/// Everything a prediction needs, loaded once and never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedArtifacts {
    pub encoder: CategoricalEncoder,
    pub scaler: FeatureScaler,
    pub model: KnnRegressor,
}

impl LoadedArtifacts {
    pub fn new(encoder: CategoricalEncoder, scaler: FeatureScaler, model: KnnRegressor) -> Self {
        LoadedArtifacts {
            encoder,
            scaler,
            model,
        }
    }

    /// Load and validate the full artifact set from a directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        log::info!("Loading artifacts from {}", dir.display());

        let encoder = CategoricalEncoder::new(
            load_vocabulary(dir, CategoricalField::Region)?,
            load_vocabulary(dir, CategoricalField::SoilType)?,
            load_vocabulary(dir, CategoricalField::Crop)?,
            load_vocabulary(dir, CategoricalField::WeatherCondition)?,
        );

        let scaler_path = dir.join(SCALER_FILE);
        let scaler = scaler_from_file(read_json(&scaler_path)?)
            .map_err(|m| load_error(&scaler_path, m))?;

        let model_path = dir.join(MODEL_FILE);
        let file: ModelFile = read_json(&model_path)?;
        let model = KnnRegressor::new(file.n_neighbors, file.features, file.targets)
            .map_err(|m| load_error(&model_path, m))?;
        check_model_codes(&model, &encoder).map_err(|m| load_error(&model_path, m))?;

        log::info!(
            "Loaded model: k={}, {} training rows",
            model.k(),
            model.n_samples()
        );

        Ok(LoadedArtifacts::new(encoder, scaler, model))
    }

    /// Write the artifact set in the format [`LoadedArtifacts::load`] reads
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        for field in CategoricalField::ALL {
            let file = EncoderFile {
                classes: self.encoder.categories(field).to_vec(),
            };
            write_json(&dir.join(encoder_file(field)), &file)?;
        }

        let ranges = ScalerColumn::ALL.map(|c| self.scaler.range(c));
        let scaler = ScalerFile {
            data_min: ranges.iter().map(|r| r.min).collect(),
            data_max: ranges.iter().map(|r| r.max).collect(),
        };
        write_json(&dir.join(SCALER_FILE), &scaler)?;

        let model = ModelFile {
            n_neighbors: self.model.k(),
            features: self.model.training_rows().map(|r| r.to_vec()).collect(),
            targets: self.model.targets().to_vec(),
        };
        write_json(&dir.join(MODEL_FILE), &model)?;
        Ok(())
    }
}

fn load_vocabulary(dir: &Path, field: CategoricalField) -> Result<Vocabulary> {
    let path = dir.join(encoder_file(field));
    let file: EncoderFile = read_json(&path)?;
    let vocab = Vocabulary::from_classes(file.classes).map_err(|m| load_error(&path, m))?;
    log::debug!("  {}: {} classes", field, vocab.len());
    Ok(vocab)
}

/// Feature columns holding label codes, by field
const CODE_COLUMNS: [(usize, CategoricalField); 4] = [
    (0, CategoricalField::Region),
    (1, CategoricalField::SoilType),
    (2, CategoricalField::Crop),
    (7, CategoricalField::WeatherCondition),
];

/// Feature columns holding Yes/No flags
const FLAG_COLUMNS: [usize; 2] = [5, 6];

/// Training rows must only use codes the encoders can produce
fn check_model_codes(
    model: &KnnRegressor,
    encoder: &CategoricalEncoder,
) -> std::result::Result<(), String> {
    for (i, row) in model.training_rows().enumerate() {
        for (col, field) in CODE_COLUMNS {
            let code = row[col];
            let classes = encoder.vocabulary(field).len();
            if code < 0.0 || code.fract() != 0.0 || code >= classes as f64 {
                return Err(format!(
                    "training row {} has {} code {}, vocabulary has {} classes",
                    i, field, code, classes
                ));
            }
        }
        for col in FLAG_COLUMNS {
            if row[col] != 0.0 && row[col] != 1.0 {
                return Err(format!(
                    "training row {} has flag {} in column {}, expected 0 or 1",
                    i, row[col], col
                ));
            }
        }
    }
    Ok(())
}

fn scaler_from_file(file: ScalerFile) -> std::result::Result<FeatureScaler, String> {
    if file.data_min.len() != 3 || file.data_max.len() != 3 {
        return Err(format!(
            "expected 3 columns (rainfall, temperature, yield), got {} mins and {} maxes",
            file.data_min.len(),
            file.data_max.len()
        ));
    }
    let range = |i: usize| {
        ColumnRange::new(file.data_min[i], file.data_max[i]).map_err(|e| format!("column {}: {}", i, e))
    };
    Ok(FeatureScaler::new(range(0)?, range(1)?, range(2)?))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| load_error(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| load_error(path, e.to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn load_error(path: &Path, message: String) -> YieldError {
    YieldError::ArtifactLoad {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::encoding::tests::test_encoder;
    use crate::features::scaling::tests::test_scaler;
    use crate::model::knn::tests::test_model;

    pub(crate) fn test_artifacts() -> LoadedArtifacts {
        LoadedArtifacts::new(test_encoder(), test_scaler(), test_model())
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = test_artifacts();
        artifacts.save(dir.path()).unwrap();

        assert!(dir.path().join("le_Soil_Type.json").exists());
        assert!(dir.path().join("le_Weather_Condition.json").exists());

        let loaded = LoadedArtifacts::load(dir.path()).unwrap();
        assert_eq!(loaded, artifacts);
    }

    #[test]
    fn test_bundled_models_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let artifacts = LoadedArtifacts::load(dir).unwrap();

        assert_eq!(artifacts.model.k(), 5);
        for field in CategoricalField::ALL {
            assert!(!artifacts.encoder.vocabulary(field).is_empty());
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        test_artifacts().save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(MODEL_FILE)).unwrap();

        match LoadedArtifacts::load(dir.path()) {
            Err(YieldError::ArtifactLoad { path, .. }) => assert!(path.ends_with(MODEL_FILE)),
            other => panic!("expected artifact error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let dir = tempfile::tempdir().unwrap();
        test_artifacts().save(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("le_Crop.json"),
            r#"{"classes": ["Rice", "Rice"]}"#,
        )
        .unwrap();

        assert!(matches!(
            LoadedArtifacts::load(dir.path()),
            Err(YieldError::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_model_codes_outside_vocabulary_rejected() {
        let dir = tempfile::tempdir().unwrap();
        test_artifacts().save(dir.path()).unwrap();

        for bad in [
            r#"{"n_neighbors": 1, "features": [[42,0,0,0.1,0.1,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,9,0.1,0.1,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,3,0,0.1,0.1,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,0,0.1,0.1,0,0,3]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[-1,0,0,0.1,0.1,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0.5,0,0,0.1,0.1,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,0,0.1,0.1,2,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,0,0.1,0.1,0,0.5,0]], "targets": [0.5]}"#,
        ] {
            std::fs::write(dir.path().join(MODEL_FILE), bad).unwrap();
            match LoadedArtifacts::load(dir.path()) {
                Err(YieldError::ArtifactLoad { path, .. }) => {
                    assert!(path.ends_with(MODEL_FILE), "{bad}")
                }
                other => panic!("expected artifact error for {bad}, got {other:?}"),
            }
        }

        // Highest valid codes still load
        std::fs::write(
            dir.path().join(MODEL_FILE),
            r#"{"n_neighbors": 1, "features": [[3,2,2,1.5,-0.2,1,1,2]], "targets": [0.5]}"#,
        )
        .unwrap();
        assert!(LoadedArtifacts::load(dir.path()).is_ok());
    }

    #[test]
    fn test_bad_scaler_rejected() {
        let dir = tempfile::tempdir().unwrap();
        test_artifacts().save(dir.path()).unwrap();

        for bad in [
            r#"{"data_min": [0, 10], "data_max": [300, 40]}"#,
            r#"{"data_min": [0, 10, 5], "data_max": [300, 40, 5]}"#,
            r#"{"data_min": [0, 10, 1]}"#,
        ] {
            std::fs::write(dir.path().join(SCALER_FILE), bad).unwrap();
            assert!(
                matches!(LoadedArtifacts::load(dir.path()), Err(YieldError::ArtifactLoad { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_bad_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        test_artifacts().save(dir.path()).unwrap();

        for bad in [
            r#"{"n_neighbors": 5, "features": [[0,0,0,0,0,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,0,0,0,0,0]], "targets": [0.5]}"#,
            r#"{"n_neighbors": 1, "features": [[0,0,0,0,0,0,0,0]], "targets": []}"#,
        ] {
            std::fs::write(dir.path().join(MODEL_FILE), bad).unwrap();
            assert!(
                matches!(LoadedArtifacts::load(dir.path()), Err(YieldError::ArtifactLoad { .. })),
                "{bad}"
            );
        }
    }
}
