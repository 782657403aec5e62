//! Sentiment polarity and sarcasm detection in one call.
//!
//! Two local sequence classifiers, powered by [Candle](https://github.com/huggingface/candle),
//! are run on the same text and merged into a single JSON judgment. The
//! analyzer is served as a web form and as an MCP tool.

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod analyzer;
pub mod config;
pub mod error;
pub mod server;

pub use analyzer::{
    AnalysisResult, Analyzer, Assessment, Classification, Classifier, ClassifierFailure,
};
pub use pipelines::text_classification;
