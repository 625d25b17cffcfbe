#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! OData metadata to TypeScript client generation.
//!
//! [`generate`] runs the whole pipeline: EDMX documents are parsed
//! ([`edmx`]), digested into an immutable [`ir::DataModel`] ([`digest`]),
//! and handed to the model, query object and service generators
//! ([`generator`]), which print TypeScript through the [`ts`] AST.
//! [`runtime`] implements the URL and body rules of the generated services
//! in Rust.

pub mod digest;
pub mod edmx;
pub mod error;
pub mod generator;
pub mod ir;
pub mod naming;
pub mod resolve;
pub mod runtime;
pub mod ts;

#[cfg(test)]
mod test_support;

use odata2ts_common::RunOptions;
use tracing::info;

pub use error::{Error, LookupKind, Result};

use crate::edmx::Edmx;
use crate::generator::{Artifact, GeneratedFile};
use crate::ir::DataModel;
use crate::naming::NamingHelper;

/// Everything one generation run produces.
#[derive(Debug)]
pub struct GenerationOutput {
    pub model: DataModel,
    pub naming: NamingHelper,
    pub artifacts: Vec<Artifact>,
    pub files: Vec<GeneratedFile>,
}

/// Parse, digest and generate from EDMX documents of one service.
pub fn generate(sources: &[&str], options: &RunOptions) -> Result<GenerationOutput> {
    options.validate()?;

    let documents = sources
        .iter()
        .map(|xml| Edmx::from_xml(xml))
        .collect::<Result<Vec<_>>>()?;
    let (model, naming) = digest::digest_documents(&documents, options)?;

    let artifacts = generator::generate_all(&model, &naming, options)?;
    let files = generator::assemble_files(&artifacts, &naming);
    info!(
        service = %model.service_name(),
        version = %model.version(),
        files = files.len(),
        "generation finished"
    );

    Ok(GenerationOutput {
        model,
        naming,
        artifacts,
        files,
    })
}
