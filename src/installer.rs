//! Query catalog installer
//! -----------------------
//! Registers mapping definitions with the query engine. A container holding no entries
//! cannot be queried unless its schema was registered beforehand, so every container
//! that may be empty at startup gets a schema-bearing mapping here, whether or not it
//! is ever seeded.
//!
//! Definitions are attempted in order but form a set: each is create-if-absent, a
//! failure is recorded and the rest still run.

use std::sync::Arc;

use tracing::{error, info};

use crate::constants;
use crate::error::InitError;
use crate::query::mapping::{BackingKind, EntryFormat, FieldType, MappingDefinition, MappingError, OPT_AUTO_OFFSET_RESET, OPT_BOOTSTRAP_SERVERS};
use crate::query::QueryEngine;

/// Result of one definition.
#[derive(Debug, Clone)]
pub struct InstallStep {
    pub name: String,
    pub statement: String,
    pub error: Option<InitError>,
}

#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub steps: Vec<InstallStep>,
}

impl InstallReport {
    pub fn ok(&self) -> bool { self.steps.iter().all(|s| s.error.is_none()) }
    pub fn errors(&self) -> Vec<InitError> { self.steps.iter().filter_map(|s| s.error.clone()).collect() }
    pub fn failed_names(&self) -> Vec<&str> { self.steps.iter().filter(|s| s.error.is_some()).map(|s| s.name.as_str()).collect() }
}

pub struct QueryCatalogInstaller {
    engine: Arc<dyn QueryEngine>,
}

impl QueryCatalogInstaller {
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self { Self { engine } }

    /// Attempt every definition; true only if all succeeded.
    pub fn install(&self, definitions: &[MappingDefinition]) -> bool { self.install_report(definitions).ok() }

    pub fn install_report(&self, definitions: &[MappingDefinition]) -> InstallReport {
        let report = InstallReport { steps: definitions.iter().map(|d| self.install_one(d)).collect() };
        self.log_summary(&report);
        report
    }

    /// Like `install_report`, for definitions that may have failed to build. A build
    /// failure is recorded as a failed step and the remaining definitions still run.
    pub fn install_built(&self, built: Vec<BuiltDefinition>) -> InstallReport {
        let mut report = InstallReport::default();
        for (name, result) in built {
            let step = match result {
                Ok(def) => self.install_one(&def),
                Err(e) => {
                    error!(target: "grid_bootstrap::ddl", "mapping '{}' invalid: {}", name, e);
                    let error = InitError::catalog("mapping_invalid".to_string(), format!("{}: {}", name, e));
                    InstallStep { name, statement: String::new(), error: Some(error) }
                }
            };
            report.steps.push(step);
        }
        self.log_summary(&report);
        report
    }

    fn install_one(&self, def: &MappingDefinition) -> InstallStep {
        let statement = def.render();
        info!(target: "grid_bootstrap::ddl", "Definition '{}'", statement);
        let error = match self.engine.execute(&statement) {
            Ok(()) => None,
            Err(e) => {
                error!(target: "grid_bootstrap::ddl", "mapping '{}' rejected: {:#} statement='{}'", def.name(), e, statement);
                Some(InitError::catalog("mapping_rejected".to_string(), format!("{}: {:#}", def.name(), e)))
            }
        };
        InstallStep { name: def.name().to_string(), statement, error }
    }

    fn log_summary(&self, report: &InstallReport) {
        let failed = report.failed_names();
        info!(target: "grid_bootstrap::ddl", "installed {} definitions, {} failed {:?}", report.steps.len(), failed.len(), failed);
    }
}

/// Mapping name paired with the outcome of building its definition.
pub type BuiltDefinition = (String, Result<MappingDefinition, MappingError>);

/// Mapping for the external trades stream. The mapping name carries a prefix so it
/// never clashes with the trades container.
pub fn trades_stream_definition(source_address: &str) -> Result<MappingDefinition, MappingError> {
    MappingDefinition::builder(format!("{}{}", constants::KAFKA_TOPIC_MAPPING_PREFIX, constants::KAFKA_TOPIC_NAME_TRADES), BackingKind::Kafka)
        .external_name(constants::KAFKA_TOPIC_NAME_TRADES)
        .field("id", FieldType::Varchar)
        .field("price", FieldType::Bigint)
        .field("quantity", FieldType::Bigint)
        .field("symbol", FieldType::Varchar)
        .field("timestamp", FieldType::Bigint)
        .key_format(EntryFormat::Primitive(FieldType::Varchar))
        .value_format(EntryFormat::JsonFlat)
        .option(OPT_AUTO_OFFSET_RESET, "earliest")
        .option(OPT_BOOTSTRAP_SERVERS, source_address.trim())
        .build()
}

fn container(name: &str, key: EntryFormat, value: EntryFormat) -> Result<MappingDefinition, MappingError> {
    MappingDefinition::builder(name, BackingKind::IMap).key_format(key).value_format(value).build()
}

fn compact(type_name: &str) -> EntryFormat { EntryFormat::Compact { type_name: type_name.to_string() } }

const VARCHAR: EntryFormat = EntryFormat::Primitive(FieldType::Varchar);

fn built(name: &str, result: Result<MappingDefinition, MappingError>) -> BuiltDefinition { (name.to_string(), result) }

/// Mappings over the shared containers, each built on its own.
pub fn container_definition_set() -> Vec<BuiltDefinition> {
    vec![
        built(constants::MAP_NAME_AGGREGATE_QUERY_RESULTS, container(constants::MAP_NAME_AGGREGATE_QUERY_RESULTS, VARCHAR, compact(constants::TYPE_NAME_AGGREGATE_RESULT))),
        built(
            constants::MAP_NAME_ALERTS_MAX_VOLUME,
            MappingDefinition::builder(constants::MAP_NAME_ALERTS_MAX_VOLUME, BackingKind::IMap)
                .field("__key", FieldType::Bigint)
                .field("timestamp", FieldType::Varchar)
                .field("symbol", FieldType::Varchar)
                .field("volume", FieldType::Bigint)
                .key_format(EntryFormat::Primitive(FieldType::Bigint))
                .value_format(EntryFormat::JsonFlat)
                .build(),
        ),
        built(constants::MAP_NAME_KAFKA_CONFIG, container(constants::MAP_NAME_KAFKA_CONFIG, VARCHAR, VARCHAR)),
        built(constants::MAP_NAME_SYMBOLS, container(constants::MAP_NAME_SYMBOLS, VARCHAR, compact(constants::TYPE_NAME_SYMBOL_INFO))),
        built(constants::MAP_NAME_TRADES, container(constants::MAP_NAME_TRADES, VARCHAR, compact(constants::TYPE_NAME_TRADE))),
        built(constants::MAP_NAME_PYTHON_SENTIMENT, container(constants::MAP_NAME_PYTHON_SENTIMENT, VARCHAR, VARCHAR)),
        built(constants::MAP_NAME_JOB_CONTROL, container(constants::MAP_NAME_JOB_CONTROL, VARCHAR, VARCHAR)),
    ]
}

/// The trades stream plus every container mapping, each built on its own so a bad
/// stream address cannot keep the containers from being mapped.
pub fn default_definition_set(source_address: &str) -> Vec<BuiltDefinition> {
    let stream_name = format!("{}{}", constants::KAFKA_TOPIC_MAPPING_PREFIX, constants::KAFKA_TOPIC_NAME_TRADES);
    let mut set = vec![(stream_name, trades_stream_definition(source_address))];
    set.extend(container_definition_set());
    set
}

pub fn container_definitions() -> Result<Vec<MappingDefinition>, MappingError> {
    container_definition_set().into_iter().map(|(_, r)| r).collect()
}

/// Full default set; fails on the first definition that does not build.
pub fn default_definitions(source_address: &str) -> Result<Vec<MappingDefinition>, MappingError> {
    default_definition_set(source_address).into_iter().map(|(_, r)| r).collect()
}
