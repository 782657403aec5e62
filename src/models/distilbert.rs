use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{linear, Linear};
use candle_transformers::models::distilbert::{Config, DistilBertModel};
use tokenizers::Tokenizer;

use super::{encode, top_prediction, EncoderDims, HubCheckpoint};
use crate::error::Result;
use crate::loaders::{CheckpointLoader, TokenizerLoader};
use crate::pipelines::text_classification::{Prediction, TextClassificationModel};

/// `DistilBertForSequenceClassification`: a `pre_classifier` projection and
/// ReLU over the `[CLS]` hidden state, then the `classifier` layer.
pub struct DistilBertClassifier {
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    labels: Vec<String>,
    max_len: usize,
    device: Device,
}

impl DistilBertClassifier {
    fn load(checkpoint: &HubCheckpoint, device: Device) -> Result<Self> {
        let loaded = CheckpointLoader::new(&checkpoint.repo).load(&device)?;
        let config: Config = serde_json::from_str(&loaded.config)?;
        let dims: EncoderDims = serde_json::from_str(&loaded.config)?;

        let model = DistilBertModel::load(loaded.vb.pp("distilbert"), &config)?;
        let pre_classifier = linear(
            dims.hidden_size,
            dims.hidden_size,
            loaded.vb.pp("pre_classifier"),
        )?;
        let classifier = linear(
            dims.hidden_size,
            loaded.labels.len(),
            loaded.vb.pp("classifier"),
        )?;

        Ok(Self {
            model,
            pre_classifier,
            classifier,
            labels: loaded.labels,
            max_len: dims.max_position_embeddings,
            device,
        })
    }

    fn logits(&self, input_ids: &Tensor) -> Result<Tensor> {
        // Single unpadded sequence: nothing is masked out.
        let seq_len = input_ids.dim(1)?;
        let mask = Tensor::zeros((1, 1, 1, seq_len), DType::U8, &self.device)?;

        let hidden = self.model.forward(input_ids, &mask)?;
        let cls = hidden.i((.., 0))?;
        let cls = self.pre_classifier.forward(&cls)?.relu()?;
        Ok(self.classifier.forward(&cls)?)
    }
}

impl TextClassificationModel for DistilBertClassifier {
    type Options = HubCheckpoint;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        Self::load(&options, device)
    }

    fn predict(&self, tokenizer: &Tokenizer, text: &str) -> Result<Prediction> {
        let input_ids = encode(tokenizer, text, self.max_len, &self.device)?;
        top_prediction(&self.logits(&input_ids)?, &self.labels)
    }

    fn get_tokenizer(options: Self::Options) -> Result<Tokenizer> {
        TokenizerLoader::new(&options.repo).load()
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
