pub(crate) mod cache;
pub(crate) mod stats;
pub(crate) mod utils;

pub mod text_classification;
