//! Metadata fixtures shared by unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use odata2ts_common::RunOptions;

use crate::digest::digest_documents;
use crate::edmx::Edmx;
use crate::ir::DataModel;
use crate::naming::NamingHelper;

/// Trimmed TripPin service.
pub const TRIPPIN: &str = include_str!("../tests/fixtures/trippin.xml");

pub fn digest_v4(xml: &str) -> (DataModel, NamingHelper) {
    digest_with(xml, &RunOptions::default())
}

pub fn digest_with(xml: &str, options: &RunOptions) -> (DataModel, NamingHelper) {
    let edmx = Edmx::from_xml(xml).unwrap();
    digest_documents(&[edmx], options).unwrap()
}
