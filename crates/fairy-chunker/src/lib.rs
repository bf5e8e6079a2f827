//! Text chunking for File Fairy.
//!
//! [`chunk_text`] splits text into fixed-size, overlapping character windows;
//! [`FixedSizeChunker`] exposes it through the [`fairy_core::Chunker`] trait.

pub mod fixed;

pub use fixed::{chunk_text, FixedSizeChunker};
