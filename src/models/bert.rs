use candle_core::{Device, IndexOp, Module, Tensor};
use candle_nn::{linear, Linear};
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;

use super::{encode, top_prediction, EncoderDims, HubCheckpoint};
use crate::error::Result;
use crate::loaders::{CheckpointLoader, TokenizerLoader};
use crate::pipelines::text_classification::{Prediction, TextClassificationModel};

/// `BertForSequenceClassification`: the tanh pooler over `[CLS]` followed by
/// the `classifier` layer.
pub struct BertClassifier {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    labels: Vec<String>,
    max_len: usize,
    device: Device,
}

impl BertClassifier {
    fn load(checkpoint: &HubCheckpoint, device: Device) -> Result<Self> {
        let loaded = CheckpointLoader::new(&checkpoint.repo).load(&device)?;
        let config: Config = serde_json::from_str(&loaded.config)?;
        let dims: EncoderDims = serde_json::from_str(&loaded.config)?;

        let model = BertModel::load(loaded.vb.pp("bert"), &config)?;
        let pooler = linear(
            dims.hidden_size,
            dims.hidden_size,
            loaded.vb.pp("bert.pooler.dense"),
        )?;
        let classifier = linear(
            dims.hidden_size,
            loaded.labels.len(),
            loaded.vb.pp("classifier"),
        )?;

        Ok(Self {
            model,
            pooler,
            classifier,
            labels: loaded.labels,
            max_len: dims.max_position_embeddings,
            device,
        })
    }

    fn logits(&self, input_ids: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self
            .model
            .forward(input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        Ok(self.classifier.forward(&pooled)?)
    }
}

impl TextClassificationModel for BertClassifier {
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
