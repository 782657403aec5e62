// ============ Model implementations ============

pub(crate) mod bert;
pub(crate) mod distilbert;

pub use bert::BertClassifier;
pub use distilbert::DistilBertClassifier;

use candle_core::{Device, Tensor, D};
use candle_nn::ops::softmax;
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};
use crate::pipelines::cache::ModelOptions;
use crate::pipelines::text_classification::Prediction;

/// A Hugging Face Hub repository holding a sequence classification checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubCheckpoint {
    /// Repository id, e.g. `distilbert-base-uncased-finetuned-sst-2-english`.
    pub repo: String,
}

impl HubCheckpoint {
    /// Points at `repo` on the Hub.
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }
}

impl std::fmt::Display for HubCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repo)
    }
}

impl ModelOptions for HubCheckpoint {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// The encoder sizes both heads need. DistilBERT calls the hidden size `dim`.
#[derive(Debug, Deserialize)]
pub(crate) struct EncoderDims {
    #[serde(alias = "dim")]
    pub hidden_size: usize,
    pub max_position_embeddings: usize,
}

/// Tokenizes a single text into a `(1, seq_len)` id tensor.
pub(crate) fn encode(
    tokenizer: &Tokenizer,
    text: &str,
    max_len: usize,
    device: &Device,
) -> Result<Tensor> {
    let preview = || text.chars().take(50).collect::<String>();

    let encoding = tokenizer.encode(text, true).map_err(|e| {
        PipelineError::Tokenization(format!("Tokenization failed on '{}': {}", preview(), e))
    })?;

    if encoding.len() > max_len {
        return Err(PipelineError::Tokenization(format!(
            "Input '{}...' is {} tokens; the model accepts at most {}",
            preview(),
            encoding.len(),
            max_len
        )));
    }

    Ok(Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?)
}

/// Picks the arg-max class from `(1, num_labels)` logits.
pub(crate) fn top_prediction(logits: &Tensor, labels: &[String]) -> Result<Prediction> {
    let probs = softmax(logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

    let (pred_id, score) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| PipelineError::Unexpected("Model returned no logits".into()))?;

    let label = labels.get(pred_id).cloned().ok_or_else(|| {
        PipelineError::Unexpected(format!(
            "Predicted label ID {} not in id2label. Available: {}",
            pred_id,
            labels.join(", ")
        ))
    })?;

    Ok(Prediction { label, score })
}
