use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayView4, Axis};
use serde::{Deserialize, Serialize};

use crate::dataset::Manifest;
use crate::error::{PrepError, Result};
use crate::models::{Label, TargetSize, Verdict};
use crate::pipeline::Preprocessor;

/// A trained binary model.
///
/// Input is a `(1, height, width, 3)` tensor in `[0, 1]`; output is the
/// probability that the image is real.
pub trait Classifier {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<f32>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<f32> {
        (**self).predict(input)
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Single-unit logistic model over the flattened image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub input_size: TargetSize,
    pub weights: Vec<f32>,
    /// Activation threshold, subtracted from the weighted sum:
    /// `score = sigmoid(weights . x - bias)`. A positive bias pushes
    /// scores towards fake.
    pub bias: f32,
}

impl LinearClassifier {
    pub fn new(input_size: TargetSize, weights: Vec<f32>, bias: f32) -> Result<Self> {
        let model = Self {
            input_size,
            weights,
            bias,
        };
        model.validate()?;
        Ok(model)
    }

    /// All weights zero, so the score depends on the bias alone.
    pub fn zeros(input_size: TargetSize, bias: f32) -> Self {
        Self {
            input_size,
            weights: vec![0.0; input_size.pixel_values()],
            bias,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.input_size.validate()?;
        let expected = self.input_size.pixel_values();
        if self.weights.len() != expected {
            return Err(PrepError::Model(format!(
                "expected {} weights for input {}, found {}",
                expected,
                self.input_size,
                self.weights.len()
            )));
        }
        Ok(())
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<f32> {
        let (height, width, channels) = self.input_size.image_shape();
        if input.dim() != (1, height, width, channels) {
            return Err(PrepError::Model(format!(
                "expected input shape (1, {}, {}, {}), got {:?}",
                height,
                width,
                channels,
                input.shape()
            )));
        }
        let sum: f32 = input
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum();
        Ok(sigmoid(sum - self.bias))
    }
}

/// Verdict for one image, with the known label when available.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub verdict: Verdict,
    pub true_label: Option<Label>,
}

impl Prediction {
    pub fn is_correct(&self) -> Option<bool> {
        self.true_label.map(|label| label == self.verdict.label)
    }
}

fn classify(classifier: &impl Classifier, image: Array3<f32>) -> Result<Verdict> {
    let batch = image.insert_axis(Axis(0));
    let score = classifier.predict(batch.view())?;
    Ok(Verdict::from_score(score))
}

pub fn predict_single_image(
    classifier: &impl Classifier,
    path: &Path,
    true_label: Option<Label>,
    preprocessor: &Preprocessor,
) -> Result<Prediction> {
    preprocessor.validate()?;
    let image = preprocessor.process_path(path)?;
    let verdict = classify(classifier, image)?;
    tracing::debug!(path = %path.display(), %verdict, "prediction");
    Ok(Prediction {
        verdict,
        true_label,
    })
}

/// Predict on an encoded image held in memory (e.g. an upload).
pub fn predict_bytes(
    classifier: &impl Classifier,
    bytes: &[u8],
    name: &Path,
    preprocessor: &Preprocessor,
) -> Result<Verdict> {
    preprocessor.validate()?;
    let image = preprocessor.process_bytes(bytes, name)?;
    classify(classifier, image)
}

#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub path: PathBuf,
    pub true_label: Label,
    pub verdict: Verdict,
}

impl EvaluationRecord {
    pub fn is_correct(&self) -> bool {
        self.true_label == self.verdict.label
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub records: Vec<EvaluationRecord>,
    pub skipped: usize,
}

impl Evaluation {
    /// Fraction of correct verdicts, `None` when nothing was predicted.
    pub fn accuracy(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let correct = self.records.iter().filter(|r| r.is_correct()).count();
        Some(correct as f64 / self.records.len() as f64)
    }
}

/// Predict a seeded random sample of `n` manifest rows.
/// Rows whose image fails to decode are skipped and counted.
pub fn evaluate_sample(
    classifier: &impl Classifier,
    manifest: &Manifest,
    n: usize,
    seed: u64,
    preprocessor: &Preprocessor,
) -> Result<Evaluation> {
    if n == 0 {
        return Err(PrepError::invalid("sample count must be at least 1"));
    }
    preprocessor.validate()?;

    let mut evaluation = Evaluation::default();
    for row in manifest.sample(n, seed).iter() {
        match predict_single_image(classifier, &row.path, Some(row.label), preprocessor) {
            Ok(prediction) => evaluation.records.push(EvaluationRecord {
                path: row.path.clone(),
                true_label: row.label,
                verdict: prediction.verdict,
            }),
            Err(err) if err.is_decode() => {
                tracing::warn!(path = %row.path.display(), error = %err, "skipping sample");
                evaluation.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(evaluation)
}
