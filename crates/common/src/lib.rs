//! Shared configuration types for odata2ts.
//!
//! This crate holds the read-only run configuration consumed by both the
//! generation core (`odata2ts-core`) and the `odata2ts` command line tool:
//! naming strategies per artifact kind, model affixes, primitive mapping
//! toggles and converter declarations.

pub mod config;
pub mod naming;

// Re-export commonly used types
pub use config::{ConfigError, ConverterDeclaration, RunOptions};
pub use naming::{Affixes, FileNameSettings, NameSettings, NamingOptions, NamingStrategy, OperationNameSettings};
