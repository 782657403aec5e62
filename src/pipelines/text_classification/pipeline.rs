use super::model::TextClassificationModel;
use crate::error::Result;
use crate::pipelines::stats::PipelineStats;
use std::sync::Arc;
use tokenizers::Tokenizer;

// ============ Output types ============

/// A classification with label and confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The predicted class, as named by the checkpoint (e.g. "POSITIVE", "LABEL_1").
    pub label: String,
    /// Softmax probability of that class (0.0 to 1.0).
    pub score: f32,
}

/// Output from [`TextClassificationPipeline::run`].
#[derive(Debug)]
pub struct Output {
    /// Top prediction.
    pub prediction: Prediction,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Pipeline ============

/// Classifies text with a fine-tuned sequence classifier.
///
/// Construct with [`TextClassificationPipelineBuilder`](super::TextClassificationPipelineBuilder).
/// The weights are shared: building a second pipeline for the same checkpoint
/// and device reuses the loaded model.
///
/// # Examples
///
/// ```rust,no_run
/// # use tone_analyzer::text_classification::TextClassificationPipelineBuilder;
/// # fn main() -> tone_analyzer::error::Result<()> {
/// let pipeline = TextClassificationPipelineBuilder::distilbert(
///     "distilbert-base-uncased-finetuned-sst-2-english",
/// )
/// .build()?;
///
/// let output = pipeline.run("I love this product!")?;
/// println!("{}: {:.3}", output.prediction.label, output.prediction.score);
/// # Ok(())
/// # }
/// ```
pub struct TextClassificationPipeline<M: TextClassificationModel> {
    pub(crate) model: Arc<M>,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: TextClassificationModel> TextClassificationPipeline<M> {
    /// Classify `text`. Empty input is valid and still yields a prediction.
    pub fn run(&self, text: &str) -> Result<Output> {
        let stats_builder = PipelineStats::start();
        let prediction = self.model.predict(&self.tokenizer, text)?;
        Ok(Output {
            prediction,
            stats: stats_builder.finish(1),
        })
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
