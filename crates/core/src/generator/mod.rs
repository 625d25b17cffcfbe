//! Artifact generation from the data model.
//!
//! Three generator families read the same [`DataModel`] and
//! [`NamingHelper`]: models, query objects and services. Each returns an
//! ordered list of [`Artifact`]s, one per model type, enum type, operation
//! group or service entry point. [`assemble_files`] groups the artifacts of
//! each family into one TypeScript file with merged imports.
//!
//! Generators never cache names between families; cross references work
//! because every family asks the naming helper for the same symbols.

pub mod model;
pub mod qobject;
pub mod service;

use std::collections::{BTreeMap, BTreeSet};

use odata2ts_common::RunOptions;
use tracing::info;

use crate::error::Result;
use crate::ir::{BindingKey, DataModel, ModelType, OperationType};
use crate::naming::NamingHelper;
use crate::ts::utils::capitalize_first;
use crate::ts::{Emit, TsImport, TsModule};

pub const ODATA_CORE: &str = "@odata2ts/odata-core";
pub const QUERY_OBJECTS: &str = "@odata2ts/odata-query-objects";
pub const ODATA_SERVICE: &str = "@odata2ts/odata-service";
pub const HTTP_CLIENT_API: &str = "@odata2ts/http-client-api";

/// File an artifact is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactFamily {
    Model,
    QueryObject,
    Service,
}

/// The IR entry an artifact was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    ModelType(String),
    EnumType(String),
    OperationGroup(BindingKey),
    MainService,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Primary symbol declared by the artifact.
    pub name: String,
    pub family: ArtifactFamily,
    pub source: ArtifactSource,
    pub module: TsModule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub path: String,
    pub content: String,
}

/// Run all three generator families, model artifacts first.
pub fn generate_all(
    model: &DataModel,
    naming: &NamingHelper,
    options: &RunOptions,
) -> Result<Vec<Artifact>> {
    let mut artifacts = model::generate(model, naming, options)?;
    artifacts.extend(qobject::generate(model, naming, options)?);
    artifacts.extend(service::generate(model, naming, options)?);

    info!(
        artifacts = artifacts.len(),
        service = %naming.service_name(),
        "generated artifacts"
    );
    Ok(artifacts)
}

/// Group artifacts into one file per family.
pub fn assemble_files(artifacts: &[Artifact], naming: &NamingHelper) -> Vec<GeneratedFile> {
    let families = [
        (ArtifactFamily::Model, naming.model_file_name()),
        (ArtifactFamily::QueryObject, naming.qobject_file_name()),
        (ArtifactFamily::Service, naming.service_file_name()),
    ];

    families
        .into_iter()
        .filter_map(|(family, file_name)| {
            let members: Vec<_> = artifacts.iter().filter(|a| a.family == family).collect();
            if members.is_empty() {
                return None;
            }

            let mut imports = ImportCollector::default();
            let mut decls = Vec::new();
            for artifact in members {
                imports.extend(&artifact.module.imports);
                decls.extend(artifact.module.decls.iter().cloned());
            }

            let module = TsModule {
                imports: imports.into_imports(),
                decls,
            };
            Some(GeneratedFile {
                path: format!("{file_name}.ts"),
                content: module.emit(),
            })
        })
        .collect()
}

/// Import statements keyed by module and type-only flag.
#[derive(Debug, Default)]
pub(crate) struct ImportCollector {
    entries: BTreeMap<(String, bool), BTreeSet<String>>,
}

impl ImportCollector {
    pub(crate) fn value(&mut self, from: &str, item: impl Into<String>) {
        self.insert(from, false, item.into());
    }

    pub(crate) fn type_only(&mut self, from: &str, item: impl Into<String>) {
        self.insert(from, true, item.into());
    }

    fn insert(&mut self, from: &str, type_only: bool, item: String) {
        self.entries
            .entry((from.to_string(), type_only))
            .or_default()
            .insert(item);
    }

    pub(crate) fn extend(&mut self, imports: &[TsImport]) {
        for import in imports {
            for item in &import.items {
                self.insert(&import.from, import.type_only, item.clone());
            }
        }
    }

    /// Library modules sort before relative ones.
    pub(crate) fn into_imports(self) -> Vec<TsImport> {
        let mut imports: Vec<_> = self
            .entries
            .into_iter()
            .map(|((from, type_only), items)| TsImport {
                items: items.into_iter().collect(),
                from,
                type_only,
            })
            .collect();
        imports.sort_by(|a, b| {
            a.from
                .starts_with('.')
                .cmp(&b.from.starts_with('.'))
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.type_only.cmp(&b.type_only))
        });
        imports
    }
}

/// Relative module specifier of a generated file.
pub(crate) fn local_module(file_name: &str) -> String {
    format!("./{file_name}")
}

/// Name of the parameter interface of an operation.
pub fn params_type_name(op: &OperationType) -> String {
    match &op.binding {
        BindingKey::Root => format!("{}Params", capitalize_first(&op.name)),
        BindingKey::Bound(binding) => {
            format!("{binding}{}Params", capitalize_first(&op.name))
        }
    }
}

/// `<Model>Id` of the nearest ancestor declaring a key.
pub(crate) fn id_type_name(model: &DataModel, declared: &ModelType) -> Result<Option<String>> {
    let chain = model.base_chain(declared)?;
    Ok(chain
        .iter()
        .find(|m| !m.keys.is_empty())
        .map(|keyed| format!("{}Id", keyed.name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::OperationKind;
    use crate::test_support::{TRIPPIN, digest_v4};

    #[test]
    fn test_params_type_name() {
        let (model, _) = digest_v4(TRIPPIN);
        let nearest = model
            .root_operation("getNearestAirport", OperationKind::Function)
            .unwrap();
        assert_eq!(params_type_name(nearest), "GetNearestAirportParams");

        let share = model
            .bound_operations("Person")
            .iter()
            .find(|op| op.name == "shareTrip")
            .unwrap();
        assert_eq!(params_type_name(share), "PersonShareTripParams");
    }

    #[test]
    fn test_import_collector_merges_and_sorts() {
        let mut imports = ImportCollector::default();
        imports.type_only("./TrippinModel", "Person");
        imports.value(QUERY_OBJECTS, "QueryObject");
        imports.extend(&[
            TsImport::types("./TrippinModel", vec!["Airline".into(), "Person".into()]),
            TsImport::new(QUERY_OBJECTS, vec!["QStringPath".into()]),
        ]);

        let merged = imports.into_imports();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].from, QUERY_OBJECTS);
        assert_eq!(merged[0].items, ["QStringPath", "QueryObject"]);
        assert_eq!(merged[1].items, ["Airline", "Person"]);
        assert!(merged[1].type_only);
    }

    #[test]
    fn test_id_type_name_uses_keyed_ancestor() {
        let (model, _) = digest_v4(TRIPPIN);
        let employee = model.require_model("Employee").unwrap();
        assert_eq!(id_type_name(&model, employee).unwrap().as_deref(), Some("PersonId"));
        let city = model.require_model("City").unwrap();
        assert_eq!(id_type_name(&model, city).unwrap(), None);
    }

    #[test]
    fn test_assemble_files_produces_three_files() {
        let (model, naming) = digest_v4(TRIPPIN);
        let artifacts = generate_all(&model, &naming, &RunOptions::default()).unwrap();
        let files = assemble_files(&artifacts, &naming);
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["TrippinModel.ts", "QTrippin.ts", "TrippinService.ts"]);

        let again = assemble_files(
            &generate_all(&model, &naming, &RunOptions::default()).unwrap(),
            &naming,
        );
        assert_eq!(files, again);
    }
}
