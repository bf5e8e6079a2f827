//! # fairy-extract
//!
//! Content extraction for File Fairy. Extracted text feeds both the AI
//! suggestions of the organizer and the chunk/embed pipeline of the index.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ExtractorRegistry`] | Routes files to an extractor by MIME type, then by extension |
//! | [`TextExtractor`] | UTF-8 text formats (`.txt`, `.md`, `.csv`, `.log`, `.json`, source code, ...) |
//!
//! Binary document formats (PDF, office files, HWP) are not parsed; such
//! files are still organized by the rule table but never reach the index.
//!
//! ```rust,ignore
//! use fairy_extract::ExtractorRegistry;
//! use std::path::Path;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! if registry.supports(Path::new("notes.md")) {
//!     let content = registry.extract_file(Path::new("notes.md")).await?;
//! }
//! ```

pub mod registry;
pub mod text;

pub use registry::ExtractorRegistry;
pub use text::TextExtractor;
