//! Text classification pipeline.
//!
//! Runs a fine-tuned sequence classifier from the Hugging Face Hub and
//! returns its top label with a confidence score.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tone_analyzer::text_classification::TextClassificationPipelineBuilder;
//!
//! # fn main() -> tone_analyzer::error::Result<()> {
//! let pipeline = TextClassificationPipelineBuilder::distilbert(
//!     "distilbert-base-uncased-finetuned-sst-2-english",
//! )
//! .build()?;
//!
//! let output = pipeline.run("I absolutely love this product!")?;
//! println!("{} (confidence: {:.3})", output.prediction.label, output.prediction.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Architectures
//!
//! | Architecture | Example checkpoint | Builder Method |
//! |--------------|--------------------|----------------|
//! | DistilBERT | `distilbert-base-uncased-finetuned-sst-2-english` | [`TextClassificationPipelineBuilder::distilbert`] |
//! | BERT | `helinivan/english-sarcasm-detector` | [`TextClassificationPipelineBuilder::bert`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::{BertClassifier, DistilBertClassifier, HubCheckpoint};
pub use crate::pipelines::stats::PipelineStats;
pub use builder::TextClassificationPipelineBuilder;
pub use model::TextClassificationModel;
pub use pipeline::{Output, Prediction, TextClassificationPipeline};
