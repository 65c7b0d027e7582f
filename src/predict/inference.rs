//! End-to-end yield prediction

use crate::data::LoadedArtifacts;
use crate::features::{FeatureAssembler, FeatureVector};
use crate::{PredictionResult, RawInput, Result};

/// Request-scoped prediction over shared, read-only artifacts
#[derive(Debug, Clone, Copy)]
pub struct PredictionPipeline<'a> {
    artifacts: &'a LoadedArtifacts,
}

impl<'a> PredictionPipeline<'a> {
    pub fn new(artifacts: &'a LoadedArtifacts) -> Self {
        PredictionPipeline { artifacts }
    }

    pub fn artifacts(&self) -> &'a LoadedArtifacts {
        self.artifacts
    }

    pub fn assemble(&self, input: &RawInput) -> Result<FeatureVector> {
        FeatureAssembler::new(&self.artifacts.encoder, &self.artifacts.scaler).assemble(input)
    }

    /// Predict the yield for one request
    pub fn run(&self, input: &RawInput) -> Result<PredictionResult> {
        let features = self.assemble(input)?;
        let normalized_yield = self.artifacts.model.predict(&features);
        let raw_yield = self.artifacts.scaler.denormalize_yield(normalized_yield);

        Ok(PredictionResult {
            yield_value: round2(raw_yield),
            raw_yield,
            normalized_yield,
        })
    }

    /// Predict multiple requests; each one succeeds or fails on its own
    pub fn run_batch(&self, inputs: &[RawInput]) -> Vec<Result<PredictionResult>> {
        inputs.iter().map(|input| self.run(input)).collect()
    }
}

/// Round to two decimal places; exact halves go to the even neighbor
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Format a prediction for display
pub fn format_prediction(input: &RawInput, result: &PredictionResult) -> String {
    let flag = |v: &str| if v == "Yes" { "yes" } else { "no" };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} in {} ({} soil)
├─────────────────────────────────────────────────┤
│  Rainfall:         {} mm
│  Temperature:      {} °C
│  Weather:          {}
│  Fertilizer:       {}
│  Irrigation:       {}
├─────────────────────────────────────────────────┤
│  Predicted yield:  {:.2}
└─────────────────────────────────────────────────┘
"#,
        input.crop,
        input.region,
        input.soil_type,
        input.rainfall_mm.trim(),
        input.temperature_celsius.trim(),
        input.weather_condition,
        flag(&input.fertilizer_used),
        flag(&input.irrigation_used),
        result.yield_value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::artifacts::tests::test_artifacts;
    use crate::features::assembler::tests::sample_input;
    use crate::{CategoricalField, YieldError};

    #[test]
    fn test_end_to_end() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);
        let input = sample_input();

        let features = pipeline.assemble(&input).unwrap();
        assert!((features.rainfall_norm - 0.4).abs() < 1e-12);
        assert!((features.temperature_norm - 0.5).abs() < 1e-12);

        let expected = round2(artifacts.scaler.denormalize_yield(artifacts.model.predict(&features)));
        let result = pipeline.run(&input).unwrap();
        assert_eq!(result.yield_value, expected);

        // Nearest rows 0, 1, 2 -> mean 0.6 over yield range [1, 10]
        assert!((result.normalized_yield - 0.6).abs() < 1e-12);
        assert!((result.raw_yield - 6.4).abs() < 1e-9);
        assert_eq!(result.yield_value, 6.4);
    }

    #[test]
    fn test_deterministic() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);
        let input = sample_input();

        let a = pipeline.run(&input).unwrap();
        let b = pipeline.run(&input).unwrap();
        assert_eq!(a.yield_value.to_bits(), b.yield_value.to_bits());
        assert_eq!(a.raw_yield.to_bits(), b.raw_yield.to_bits());
    }

    #[test]
    fn test_unknown_category_has_no_result() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);
        let mut input = sample_input();
        input.region = "Unmapped".to_string();

        match pipeline.run(&input) {
            Err(YieldError::UnknownCategory { field, value }) => {
                assert_eq!(field, CategoricalField::Region);
                assert_eq!(value, "Unmapped");
            }
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_temperature() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);
        let mut input = sample_input();
        input.temperature_celsius = "warm".to_string();

        assert!(matches!(pipeline.run(&input), Err(YieldError::MalformedInput(_))));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);

        let mut bad = sample_input();
        bad.crop = "Quinoa".to_string();
        let inputs = vec![sample_input(), bad, sample_input()];

        let results = pipeline.run_batch(&inputs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(YieldError::UnknownCategory { .. })));
        assert_eq!(
            results[2].as_ref().unwrap().yield_value,
            results[0].as_ref().unwrap().yield_value
        );
    }

    #[test]
    fn test_concurrent_runs() {
        let artifacts = test_artifacts();
        let pipeline = PredictionPipeline::new(&artifacts);
        let expected = pipeline.run(&sample_input()).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || pipeline.run(&sample_input()).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(6.4049), 6.4);
        assert_eq!(round2(2.675 + 1e-9), 2.68);
        assert_eq!(round2(-1.005 - 1e-9), -1.01);
        assert_eq!(round2(3.0), 3.0);
    }

    #[test]
    fn test_round2_exact_halves() {
        assert_eq!(round2(6.125), 6.12);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(1.375), 1.38);
        assert_eq!(round2(-6.125), -6.12);
    }

    #[test]
    fn test_format_prediction() {
        let input = sample_input();
        let result = PredictionResult {
            yield_value: 6.4,
            raw_yield: 6.4,
            normalized_yield: 0.6,
        };
        let text = format_prediction(&input, &result);
        assert!(text.contains("Wheat in North"));
        assert!(text.contains("6.40"));
    }
}
