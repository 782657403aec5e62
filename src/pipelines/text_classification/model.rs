use super::pipeline::Prediction;
use crate::error::Result;
use tokenizers::Tokenizer;

/// A sequence classifier that can back a [`TextClassificationPipeline`](super::TextClassificationPipeline).
pub trait TextClassificationModel {
    /// Options identifying the checkpoint to load.
    type Options: std::fmt::Debug + Clone;

    /// Loads the checkpoint onto `device`.
    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Returns the highest-probability class for `text`.
    fn predict(&self, tokenizer: &Tokenizer, text: &str) -> Result<Prediction>;

    /// Loads the tokenizer matching the checkpoint.
    fn get_tokenizer(options: Self::Options) -> Result<Tokenizer>;

    /// Device the weights live on.
    fn device(&self) -> &candle_core::Device;
}
