//! Runtime configuration, read from command-line flags with environment
//! variable fallbacks.

use clap::{Args, ValueEnum};

/// Sentiment checkpoint used when none is configured.
pub const DEFAULT_SENTIMENT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
/// Sarcasm checkpoint used when none is configured.
pub const DEFAULT_SARCASM_MODEL: &str = "helinivan/english-sarcasm-detector";

/// Encoder family of a sequence classification checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArch {
    /// `BertForSequenceClassification`.
    Bert,
    /// `DistilBertForSequenceClassification`.
    Distilbert,
}

/// Which checkpoints to load and where to run them.
#[derive(Debug, Clone, Args)]
pub struct ModelConfig {
    /// Hub repo of the sentiment classifier
    #[arg(long, env = "TONE_SENTIMENT_MODEL", default_value = DEFAULT_SENTIMENT_MODEL)]
    pub sentiment_model: String,

    /// Architecture of the sentiment classifier
    #[arg(long, env = "TONE_SENTIMENT_ARCH", value_enum, default_value_t = ModelArch::Distilbert)]
    pub sentiment_arch: ModelArch,

    /// Hub repo of the sarcasm classifier
    #[arg(long, env = "TONE_SARCASM_MODEL", default_value = DEFAULT_SARCASM_MODEL)]
    pub sarcasm_model: String,

    /// Architecture of the sarcasm classifier
    #[arg(long, env = "TONE_SARCASM_ARCH", value_enum, default_value_t = ModelArch::Bert)]
    pub sarcasm_arch: ModelArch,

    /// Run inference on this CUDA device instead of the CPU
    #[arg(long, env = "TONE_CUDA")]
    pub cuda: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            sentiment_arch: ModelArch::Distilbert,
            sarcasm_model: DEFAULT_SARCASM_MODEL.to_string(),
            sarcasm_arch: ModelArch::Bert,
            cuda: None,
        }
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "TONE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TONE_PORT", default_value = "7860")]
    pub port: u16,
}
