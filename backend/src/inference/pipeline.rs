use shared::Label;

use super::model::ModelHandle;
use super::preprocess::{self, PreprocessError};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

/// Immutable outcome of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: Label,
    pub probability: f64,
    pub real_confidence: f64,
    pub fake_confidence: f64,
}

/// Composes preprocessing, the forward pass and label derivation into
/// one request/response unit. No retries, no batching.
#[derive(Clone)]
pub struct InferencePipeline {
    model: ModelHandle,
}

impl InferencePipeline {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn infer(&self, raw_image: &[u8]) -> Result<PredictionResult, InferenceError> {
        let tensor = preprocess::preprocess(raw_image)?;
        let probability = self.model.predict(&tensor);
        Ok(derive_result(probability))
    }
}

/// Maps the raw model output, interpreted as P(real), onto a label and
/// a confidence pair. A probability of exactly 0.5 classifies as fake.
pub fn derive_result(probability: f64) -> PredictionResult {
    let label = if probability > 0.5 {
        Label::Real
    } else {
        Label::Fake
    };
    let real_confidence = probability * 100.0;
    PredictionResult {
        label,
        probability,
        real_confidence,
        fake_confidence: 100.0 - real_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_probability_classifies_as_real() {
        let result = derive_result(0.73);
        assert_eq!(result.label, Label::Real);
        assert_eq!(result.real_confidence, 73.0);
        assert_eq!(result.fake_confidence, 27.0);
    }

    #[test]
    fn low_probability_classifies_as_fake() {
        let result = derive_result(0.2);
        assert_eq!(result.label, Label::Fake);
        assert_eq!(result.real_confidence, 20.0);
        assert_eq!(result.fake_confidence, 80.0);
    }

    #[test]
    fn exact_half_classifies_as_fake() {
        assert_eq!(derive_result(0.5).label, Label::Fake);
        assert_eq!(derive_result(0.5000001).label, Label::Real);
    }

    #[test]
    fn confidences_sum_to_exactly_one_hundred() {
        for probability in [0.0, 0.1, 0.25, 0.33, 0.5, 0.73, 0.9999, 1.0] {
            let result = derive_result(probability);
            assert_eq!(result.real_confidence + result.fake_confidence, 100.0);
        }
    }

    #[test]
    fn boundary_probabilities_map_to_full_confidence() {
        let certain_real = derive_result(1.0);
        assert_eq!(certain_real.real_confidence, 100.0);
        assert_eq!(certain_real.fake_confidence, 0.0);

        let certain_fake = derive_result(0.0);
        assert_eq!(certain_fake.label, Label::Fake);
        assert_eq!(certain_fake.fake_confidence, 100.0);
    }
}
