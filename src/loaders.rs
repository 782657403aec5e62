use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let hf_api = hf_hub::api::sync::ApiBuilder::new().build().map_err(|e| {
            PipelineError::Download(format!("Failed to initialize HuggingFace API: {e}"))
        })?;
        let hf_api = hf_api.model(self.repo.clone());

        let max_retries = 3u32;
        let mut attempt = 0u32;

        loop {
            match hf_api.get(self.filename.as_str()) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let error_msg = e.to_string();
                    attempt += 1;
                    // Concurrent downloads of the same file contend on the cache lock.
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries {
                        std::thread::sleep(Duration::from_millis(100 << (attempt - 1)));
                        continue;
                    }
                    return Err(PipelineError::Download(format!(
                        "Failed to download '{}' from '{}': {}",
                        self.filename, self.repo, error_msg
                    )));
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct WordPieceConfig {
    #[serde(default = "default_lower_case")]
    do_lower_case: bool,
}

fn default_lower_case() -> bool {
    true
}

/// Loads `tokenizer.json`, or assembles a BERT WordPiece tokenizer from
/// `vocab.txt` for checkpoints that only ship the slow-tokenizer files.
#[derive(Clone)]
pub struct TokenizerLoader {
    pub repo: String,
}

impl TokenizerLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        match HfLoader::new(&self.repo, "tokenizer.json").load() {
            Ok(path) => {
                let path_str = path.display().to_string();
                Tokenizer::from_file(&path).map_err(|e| {
                    PipelineError::Tokenization(format!(
                        "Failed to load tokenizer from '{}': {}",
                        path_str, e
                    ))
                })
            }
            Err(e) => {
                tracing::debug!(repo = %self.repo, error = %e, "no tokenizer.json, building from vocab.txt");
                self.load_wordpiece()
                    .map_err(|fallback| with_primary_cause(fallback, &e))
            }
        }
    }

    fn load_wordpiece(&self) -> Result<Tokenizer> {
        let vocab_path = HfLoader::new(&self.repo, "vocab.txt").load()?;
        let lowercase = match HfLoader::new(&self.repo, "tokenizer_config.json").load() {
            Ok(path) => {
                let raw: WordPieceConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                raw.do_lower_case
            }
            Err(_) => default_lower_case(),
        };

        let vocab_str = vocab_path.display().to_string();
        let wordpiece = WordPiece::from_file(&vocab_str)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| {
                PipelineError::Tokenization(format!(
                    "Failed to read vocabulary '{}': {}",
                    vocab_str, e
                ))
            })?;

        bert_wordpiece(wordpiece, lowercase)
    }
}

/// Wraps a WordPiece model in BERT's normalizer, pre-tokenizer and
/// `[CLS] ... [SEP]` post-processor.
pub(crate) fn bert_wordpiece(wordpiece: WordPiece, lowercase: bool) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::new(wordpiece);
    let special_id = |token: &str| {
        tokenizer
            .token_to_id(token)
            .ok_or_else(|| PipelineError::Tokenization(format!("Vocabulary has no {token} token")))
    };
    let cls_id = special_id("[CLS]")?;
    let sep_id = special_id("[SEP]")?;

    tokenizer
        .with_normalizer(Some(BertNormalizer::new(true, true, None, lowercase)))
        .with_pre_tokenizer(Some(BertPreTokenizer))
        .with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), sep_id),
            ("[CLS]".to_string(), cls_id),
        )));

    Ok(tokenizer)
}

/// Keeps the `tokenizer.json` error visible when the `vocab.txt` fallback
/// fails too, so a network outage is not reported as a missing vocabulary.
fn with_primary_cause(fallback: PipelineError, primary: &PipelineError) -> PipelineError {
    let context = |msg: String| format!("{msg} (tokenizer.json unavailable: {primary})");
    match fallback {
        PipelineError::Download(msg) => PipelineError::Download(context(msg)),
        PipelineError::Tokenization(msg) => PipelineError::Tokenization(context(msg)),
        PipelineError::Device(msg) => PipelineError::Device(context(msg)),
        PipelineError::Unexpected(msg) => PipelineError::Unexpected(context(msg)),
    }
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    label2id: HashMap<String, u32>,
}

/// Everything needed to assemble a sequence classifier from a Hub repo.
pub struct ClassifierCheckpoint {
    /// Raw `config.json`, parsed again by each architecture.
    pub config: String,
    pub vb: VarBuilder<'static>,
    /// Class names indexed by logit position.
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckpointLoader {
    pub config_file_loader: HfLoader,
    pub repo: String,
}

impl CheckpointLoader {
    pub fn new(repo: &str) -> Self {
        Self {
            config_file_loader: HfLoader::new(repo, "config.json"),
            repo: repo.into(),
        }
    }

    pub fn load(&self, device: &Device) -> Result<ClassifierCheckpoint> {
        let config_path = self.config_file_loader.load()?;
        let weights_path = HfLoader::new(&self.repo, "model.safetensors")
            .load()
            .or_else(|_| HfLoader::new(&self.repo, "pytorch_model.bin").load())?;

        let config = std::fs::read_to_string(&config_path)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config)?;
        let labels = ordered_labels(&class_cfg.id2label, class_cfg.label2id.len());

        let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, device)?
        };

        Ok(ClassifierCheckpoint { config, vb, labels })
    }
}

/// Turns the `id2label` map into a positional list. Checkpoints without one
/// get the `LABEL_{i}` names `transformers` would report.
fn ordered_labels(id2label: &HashMap<String, String>, label2id_len: usize) -> Vec<String> {
    let num_labels = match id2label.len().max(label2id_len) {
        0 => 2,
        n => n,
    };
    (0..num_labels)
        .map(|i| {
            id2label
                .get(&i.to_string())
                .cloned()
                .unwrap_or_else(|| format!("LABEL_{i}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_id_order() {
        let id2label: HashMap<String, String> = [("1", "POSITIVE"), ("0", "NEGATIVE")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(ordered_labels(&id2label, 2), vec!["NEGATIVE", "POSITIVE"]);
    }

    #[test]
    fn missing_id2label_falls_back_to_generic_names() {
        assert_eq!(ordered_labels(&HashMap::new(), 0), vec!["LABEL_0", "LABEL_1"]);
        assert_eq!(
            ordered_labels(&HashMap::new(), 3),
            vec!["LABEL_0", "LABEL_1", "LABEL_2"]
        );
    }

    #[test]
    fn failed_fallback_reports_both_causes() {
        let primary = PipelineError::Download(
            "Failed to download 'tokenizer.json' from 'org/model': dns error".into(),
        );
        let fallback =
            PipelineError::Download("Failed to download 'vocab.txt' from 'org/model': dns error".into());

        let err = with_primary_cause(fallback, &primary);
        assert!(matches!(err, PipelineError::Download(_)));
        let msg = err.to_string();
        assert!(msg.contains("'vocab.txt'"));
        assert!(msg.contains("'tokenizer.json'"));
    }

    #[test]
    fn wordpiece_without_special_tokens_is_rejected() {
        let vocab: tokenizers::models::bpe::Vocab = [("hello".to_string(), 0), ("[UNK]".to_string(), 1)]
            .into_iter()
            .collect();
        let wordpiece = WordPiece::builder()
            .vocab(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .unwrap();
        let err = bert_wordpiece(wordpiece, true).unwrap_err();
        assert!(err.to_string().contains("[CLS]"));
    }

    #[test]
    fn tokenizer_config_defaults_to_lowercase() {
        let raw: WordPieceConfig = serde_json::from_str("{}").unwrap();
        assert!(raw.do_lower_case);
        let raw: WordPieceConfig = serde_json::from_str(r#"{"do_lower_case": false}"#).unwrap();
        assert!(!raw.do_lower_case);
    }
}
