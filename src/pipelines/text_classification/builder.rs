use super::model::TextClassificationModel;
use super::pipeline::TextClassificationPipeline;
use crate::error::Result;
use crate::models::{BertClassifier, DistilBertClassifier, HubCheckpoint};
use crate::pipelines::cache::{global_cache, ModelOptions};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

crate::pipelines::utils::impl_device_methods!(direct: TextClassificationPipelineBuilder<M: TextClassificationModel>);

/// Builder for creating [`TextClassificationPipeline`] instances.
///
/// Use [`Self::distilbert`] or [`Self::bert`] as the entry point.
///
/// # Examples
///
/// ```rust,no_run
/// # use tone_analyzer::text_classification::TextClassificationPipelineBuilder;
/// # fn main() -> tone_analyzer::error::Result<()> {
/// let pipeline = TextClassificationPipelineBuilder::bert("helinivan/english-sarcasm-detector")
///     .cpu()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct TextClassificationPipelineBuilder<M: TextClassificationModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: TextClassificationModel> TextClassificationPipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::default(),
        }
    }

    /// Builds the pipeline with configured settings.
    ///
    /// Weights are shared with any live pipeline built from the same
    /// checkpoint on the same device.
    ///
    /// # Errors
    ///
    /// Returns an error if model loading or device initialization fails.
    pub fn build(self) -> Result<TextClassificationPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        tracing::info!(model = %key, "loading classifier");

        let model = global_cache().get_or_create(&key, || M::new(self.options.clone(), device))?;
        let tokenizer = M::get_tokenizer(self.options)?;

        Ok(TextClassificationPipeline { model, tokenizer })
    }
}

impl TextClassificationPipelineBuilder<DistilBertClassifier> {
    /// Creates a builder for a DistilBERT sequence classification checkpoint.
    pub fn distilbert(repo: impl Into<String>) -> Self {
        Self::new(HubCheckpoint::new(repo))
    }
}

impl TextClassificationPipelineBuilder<BertClassifier> {
    /// Creates a builder for a BERT sequence classification checkpoint.
    pub fn bert(repo: impl Into<String>) -> Self {
        Self::new(HubCheckpoint::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_cpu() {
        let builder = TextClassificationPipelineBuilder::distilbert("org/model");
        assert_eq!(builder.device_request, DeviceRequest::Cpu);
        assert_eq!(builder.options.cache_key(), "org/model");
    }

    #[test]
    fn device_methods_set_the_request() {
        let builder = TextClassificationPipelineBuilder::bert("org/model").cuda(1);
        assert_eq!(builder.device_request, DeviceRequest::Cuda(1));

        let builder = builder.cpu();
        assert_eq!(builder.device_request, DeviceRequest::Cpu);
    }
}
