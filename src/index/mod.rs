//! Indexing module
//!
//! Turns decoded text into stored, searchable rows:
//! - `Segmenter`: word segmentation for text without inter-word spaces
//! - `Indexer`: segments a work and writes it to the store in one transaction

mod indexer;
mod segmenter;

pub use indexer::Indexer;
pub use segmenter::{JiebaSegmenter, Segmenter};
