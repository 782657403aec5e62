//! Sentiment + sarcasm analysis.
//!
//! [`Analyzer`] runs two independent [`Classifier`]s on the same text and
//! merges their predictions into one [`AnalysisResult`].
//!
//! ```rust,no_run
//! use tone_analyzer::analyzer::Analyzer;
//! use tone_analyzer::config::ModelConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let analyzer = Analyzer::load(&ModelConfig::default())?;
//! println!("{}", analyzer.analyze_json("Oh great, another Monday.")?);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ModelArch, ModelConfig};
use crate::error::{PipelineError, Result};
use crate::pipelines::text_classification::{
    Output, TextClassificationModel, TextClassificationPipeline, TextClassificationPipelineBuilder,
};

/// Sarcasm label that always trips the flag.
pub const SARCASM_LABEL: &str = "sarcasm";

/// Rounded sarcasm scores strictly above this trip the flag whatever the label.
pub const SARCASM_SCORE_THRESHOLD: f64 = 0.9;

// ============ Classifier capability ============

/// One classifier's verdict on a text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Top label, as named by the checkpoint.
    pub label: String,
    /// Probability of `label`, in `[0, 1]`.
    pub score: f32,
    /// Time spent in the classifier.
    pub elapsed: Duration,
}

impl Classification {
    /// A verdict with no timing attached.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            elapsed: Duration::ZERO,
        }
    }
}

impl From<Output> for Classification {
    fn from(output: Output) -> Self {
        Self {
            label: output.prediction.label,
            score: output.prediction.score,
            elapsed: output.stats.total_time,
        }
    }
}

/// Anything that can label a text with a confidence score.
pub trait Classifier: Send + Sync {
    /// Returns the top class for `text`.
    fn classify(&self, text: &str) -> Result<Classification>;
}

impl<M> Classifier for TextClassificationPipeline<M>
where
    M: TextClassificationModel + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<Classification> {
        self.run(text).map(Classification::from)
    }
}

/// Which of the two classifiers an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierRole {
    /// Sentiment polarity.
    Sentiment,
    /// Sarcasm detection.
    Sarcasm,
}

impl fmt::Display for ClassifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierRole::Sentiment => write!(f, "sentiment"),
            ClassifierRole::Sarcasm => write!(f, "sarcasm"),
        }
    }
}

/// A classifier invocation failed. No partial result is produced.
#[derive(Debug, Error)]
#[error("{classifier} classifier failed: {source}")]
pub struct ClassifierFailure {
    /// The classifier that failed.
    pub classifier: ClassifierRole,
    /// What went wrong.
    #[source]
    pub source: PipelineError,
}

impl ClassifierFailure {
    fn new(classifier: ClassifierRole, source: PipelineError) -> Self {
        Self { classifier, source }
    }
}

// ============ Result record ============

/// Sentiment polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    /// `"positive"`
    Positive,
    /// `"negative"`
    Negative,
}

impl Assessment {
    /// Parses a model label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "positive" => Some(Assessment::Positive),
            "negative" => Some(Assessment::Negative),
            _ => None,
        }
    }
}

/// The merged judgment. Serializes to exactly four keys, in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Sentiment label.
    pub assessment: Assessment,
    /// Sentiment score, 3 decimals.
    pub confidence: f64,
    /// Derived from the sarcasm label and score.
    pub sarcasm_detected: bool,
    /// Sarcasm score, 3 decimals.
    pub sarcasm_confidence: f64,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Rounds a model score to 3 decimal places.
pub fn round_score(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}

/// The flag is raised by the `sarcasm` label or by a score above the
/// threshold, even when the label says otherwise.
pub fn is_sarcastic(label: &str, score: f64) -> bool {
    label.to_lowercase() == SARCASM_LABEL || score > SARCASM_SCORE_THRESHOLD
}

// ============ Analyzer ============

/// Combines a sentiment classifier and a sarcasm classifier.
///
/// Both classifiers are handed in at construction and shared read-only
/// across calls.
pub struct Analyzer {
    sentiment: Box<dyn Classifier>,
    sarcasm: Box<dyn Classifier>,
}

impl Analyzer {
    /// Wraps two already-initialized classifiers.
    pub fn new(sentiment: impl Classifier + 'static, sarcasm: impl Classifier + 'static) -> Self {
        Self {
            sentiment: Box::new(sentiment),
            sarcasm: Box::new(sarcasm),
        }
    }

    /// Downloads (or reuses) both checkpoints named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if either model or tokenizer fails to load.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let sentiment = load_classifier(&config.sentiment_model, config.sentiment_arch, config.cuda)?;
        let sarcasm = load_classifier(&config.sarcasm_model, config.sarcasm_arch, config.cuda)?;
        tracing::info!(
            sentiment = %config.sentiment_model,
            sarcasm = %config.sarcasm_model,
            "analyzer ready"
        );
        Ok(Self { sentiment, sarcasm })
    }

    /// Classifies `text` for sentiment and sarcasm.
    ///
    /// Any string is accepted, including the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierFailure`] if either classifier fails or the
    /// sentiment model reports a label other than positive/negative.
    pub fn analyze(&self, text: &str) -> std::result::Result<AnalysisResult, ClassifierFailure> {
        let sentiment = self
            .sentiment
            .classify(text)
            .map_err(|e| ClassifierFailure::new(ClassifierRole::Sentiment, e))?;
        let sarcasm = self
            .sarcasm
            .classify(text)
            .map_err(|e| ClassifierFailure::new(ClassifierRole::Sarcasm, e))?;

        let assessment = Assessment::from_label(&sentiment.label).ok_or_else(|| {
            ClassifierFailure::new(
                ClassifierRole::Sentiment,
                PipelineError::Unexpected(format!(
                    "Unexpected sentiment label '{}'; expected positive or negative",
                    sentiment.label
                )),
            )
        })?;

        let sarcasm_confidence = round_score(sarcasm.score);
        let result = AnalysisResult {
            assessment,
            confidence: round_score(sentiment.score),
            sarcasm_detected: is_sarcastic(&sarcasm.label, sarcasm_confidence),
            sarcasm_confidence,
        };

        tracing::debug!(
            sentiment_label = %sentiment.label,
            sentiment_score = sentiment.score,
            sentiment_ms = sentiment.elapsed.as_secs_f64() * 1000.0,
            sarcasm_label = %sarcasm.label,
            sarcasm_score = sarcasm.score,
            sarcasm_ms = sarcasm.elapsed.as_secs_f64() * 1000.0,
            "analyzed text"
        );

        Ok(result)
    }

    /// [`analyze`](Self::analyze), serialized to a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`analyze`](Self::analyze).
    pub fn analyze_json(&self, text: &str) -> std::result::Result<String, ClassifierFailure> {
        self.analyze(text).map(|result| result.to_string())
    }
}

fn load_classifier(repo: &str, arch: ModelArch, cuda: Option<usize>) -> Result<Box<dyn Classifier>> {
    let classifier: Box<dyn Classifier> = match arch {
        ModelArch::Bert => {
            let builder = TextClassificationPipelineBuilder::bert(repo);
            let builder = match cuda {
                Some(index) => builder.cuda(index),
                None => builder.cpu(),
            };
            Box::new(builder.build()?)
        }
        ModelArch::Distilbert => {
            let builder = TextClassificationPipelineBuilder::distilbert(repo);
            let builder = match cuda {
                Some(index) => builder.cuda(index),
                None => builder.cpu(),
            };
            Box::new(builder.build()?)
        }
    };
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::text_classification::{PipelineStats, Prediction};
    use proptest::prelude::*;

    struct Fixed(&'static str, f32);

    impl Classifier for Fixed {
        fn classify(&self, _text: &str) -> Result<Classification> {
            Ok(Classification::new(self.0, self.1))
        }
    }

    struct Failing;

    impl Classifier for Failing {
        fn classify(&self, _text: &str) -> Result<Classification> {
            Err(PipelineError::Tokenization("input too long".into()))
        }
    }

    #[test]
    fn benign_text_is_not_sarcastic() {
        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.999), Fixed("not-sarcasm", 0.02));
        let json = analyzer.analyze_json("I love this!").unwrap();
        assert_eq!(
            json,
            r#"{"assessment":"positive","confidence":0.999,"sarcasm_detected":false,"sarcasm_confidence":0.02}"#
        );
    }

    #[test]
    fn sarcasm_label_trips_flag() {
        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.6), Fixed("sarcasm", 0.95));
        let result = analyzer.analyze("Oh great, another Monday.").unwrap();
        assert_eq!(result.assessment, Assessment::Positive);
        assert!(result.sarcasm_detected);
        assert_eq!(result.sarcasm_confidence, 0.95);
    }

    #[test]
    fn sarcasm_label_with_low_score_still_trips_flag() {
        let analyzer = Analyzer::new(Fixed("NEGATIVE", 0.7), Fixed("Sarcasm", 0.51));
        assert!(analyzer.analyze("sure, whatever").unwrap().sarcasm_detected);
    }

    #[test]
    fn high_score_trips_flag_regardless_of_label() {
        let analyzer = Analyzer::new(Fixed("NEGATIVE", 0.8), Fixed("LABEL_0", 0.97));
        let result = analyzer.analyze("text").unwrap();
        assert_eq!(result.assessment, Assessment::Negative);
        assert!(result.sarcasm_detected);
    }

    #[test]
    fn threshold_compares_rounded_score() {
        // 0.9004 rounds to 0.9, which is not above the threshold.
        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.5), Fixed("LABEL_0", 0.9004));
        let result = analyzer.analyze("text").unwrap();
        assert_eq!(result.sarcasm_confidence, 0.9);
        assert!(!result.sarcasm_detected);

        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.5), Fixed("LABEL_0", 0.9006));
        assert!(analyzer.analyze("text").unwrap().sarcasm_detected);
    }

    #[test]
    fn empty_text_yields_well_formed_result() {
        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.7481), Fixed("LABEL_0", 0.6));
        let json = analyzer.analyze_json("").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(value["confidence"], 0.748);
    }

    #[test]
    fn sentiment_failure_names_classifier() {
        let analyzer = Analyzer::new(Failing, Fixed("LABEL_0", 0.1));
        let err = analyzer.analyze("text").unwrap_err();
        assert_eq!(err.classifier, ClassifierRole::Sentiment);
        assert_eq!(err.to_string(), "sentiment classifier failed: input too long");
    }

    #[test]
    fn sarcasm_failure_names_classifier() {
        let analyzer = Analyzer::new(Fixed("POSITIVE", 0.9), Failing);
        let err = analyzer.analyze("text").unwrap_err();
        assert_eq!(err.classifier, ClassifierRole::Sarcasm);
    }

    #[test]
    fn unknown_sentiment_label_is_a_failure() {
        let analyzer = Analyzer::new(Fixed("NEUTRAL", 0.9), Fixed("LABEL_0", 0.1));
        let err = analyzer.analyze("text").unwrap_err();
        assert_eq!(err.classifier, ClassifierRole::Sentiment);
        assert!(err.to_string().contains("NEUTRAL"));
    }

    #[test]
    fn classification_keeps_pipeline_timing() {
        let output = Output {
            prediction: Prediction {
                label: "sarcasm".into(),
                score: 0.93,
            },
            stats: PipelineStats {
                total_time: Duration::from_millis(42),
                items_processed: 1,
            },
        };
        let classification = Classification::from(output);
        assert_eq!(classification.label, "sarcasm");
        assert_eq!(classification.score, 0.93);
        assert_eq!(classification.elapsed, Duration::from_millis(42));
    }

    #[test]
    fn assessment_label_is_case_insensitive() {
        assert_eq!(Assessment::from_label("POSITIVE"), Some(Assessment::Positive));
        assert_eq!(Assessment::from_label("negative"), Some(Assessment::Negative));
        assert_eq!(Assessment::from_label("LABEL_1"), None);
    }

    proptest! {
        #[test]
        fn scores_are_rounded_to_three_places(score in 0.0f32..=1.0) {
            let rounded = round_score(score);
            prop_assert!((0.0..=1.0).contains(&rounded));
            prop_assert_eq!((rounded * 1000.0).round() / 1000.0, rounded);
            prop_assert!((rounded - f64::from(score)).abs() <= 0.0005 + 1e-9);
        }

        #[test]
        fn flag_follows_decision_rule(
            label in prop::sample::select(vec!["sarcasm", "SARCASM", "not-sarcasm", "LABEL_0", "LABEL_1"]),
            score in 0.0f32..=1.0,
        ) {
            let analyzer = Analyzer::new(Fixed("POSITIVE", 0.5), Fixed(label, score));
            let result = analyzer.analyze("text").unwrap();
            let expected = label.eq_ignore_ascii_case("sarcasm") || round_score(score) > 0.9;
            prop_assert_eq!(result.sarcasm_detected, expected);
        }

        #[test]
        fn output_has_exactly_four_keys(text in ".*", s1 in 0.0f32..=1.0, s2 in 0.0f32..=1.0) {
            let analyzer = Analyzer::new(Fixed("NEGATIVE", s1), Fixed("LABEL_1", s2));
            let json = analyzer.analyze_json(&text).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();

            let mut keys: Vec<_> = value.as_object().unwrap().keys().map(String::as_str).collect();
            keys.sort_unstable();
            prop_assert_eq!(keys, vec!["assessment", "confidence", "sarcasm_confidence", "sarcasm_detected"]);

            // Field order is checked on the serialized text, not the parsed map.
            let fields = [
                "\"assessment\"",
                "\"confidence\"",
                "\"sarcasm_detected\"",
                "\"sarcasm_confidence\"",
            ];
            let positions: Vec<_> = fields
                .iter()
                .map(|key| json.find(key).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
