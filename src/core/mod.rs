//! Core Business Logic
//!
//! Document synchronization and diagnostic production, independent of the
//! LSP transport.

pub mod diagnostics;
pub mod document;
pub mod patch;

pub use diagnostics::{diagnose, Finding};
pub use document::{DocumentManager, DocumentSource, FileSystem};
pub use patch::{Edit, TextPosition, TextRange};
