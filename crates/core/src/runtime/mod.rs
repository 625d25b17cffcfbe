//! Reference runtime for generated services.
//!
//! Implements the URL, key and body rules of the generated façades in Rust,
//! against the same [`DataModel`](crate::ir::DataModel), so they can be
//! checked without a TypeScript toolchain.

pub mod client;
pub mod literal;
pub mod qobject;
pub mod service;

pub use client::{ClientError, HttpMethod, ODataClient, ODataRequest, RecordingClient};
pub use literal::{EntityKey, action_body, format_literal, render_function_call, render_key};
pub use qobject::QueryObject;
pub use service::{
    CollectionService, ComplexService, EntityService, EntitySetService, MainService, Navigation,
    ServiceError,
};
