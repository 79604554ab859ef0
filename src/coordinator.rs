//! Initialization coordinator.
//!
//! May be invoked by any member or client at startup without checking whether a peer
//! already did the work: every step is idempotent, so N invocations, sequential or
//! concurrent, converge to the state of one. Steps run in a fixed order on the calling
//! thread. Failures are logged and reported, never raised; a peer may have finished the
//! work already, and a later full re-run picks up whatever is missing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::InitConfig;
use crate::error::InitError;
use crate::installer::{self, QueryCatalogInstaller};
use crate::objects::SharedObjectCatalog;
use crate::query::QueryEngine;
use crate::reference::ReferenceSource;
use crate::seed::SeedDataLoader;
use crate::storage::SharedStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateNeededObjects,
    LoadNeededData,
    DefineQueryableObjects,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub ok: bool,
    pub errors: Vec<InitError>,
}

/// Everything one `run_report` observed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub steps: Vec<StepOutcome>,
}

impl InitReport {
    pub fn ok(&self) -> bool { self.steps.iter().all(|s| s.ok) }
    pub fn errors(&self) -> Vec<InitError> { self.steps.iter().flat_map(|s| s.errors.iter().cloned()).collect() }
}

pub struct InitializationCoordinator {
    config: InitConfig,
    objects: SharedObjectCatalog,
    loader: SeedDataLoader,
    installer: QueryCatalogInstaller,
}

impl InitializationCoordinator {
    pub fn new(config: InitConfig, storage: Arc<dyn SharedStorage>, engine: Arc<dyn QueryEngine>, source: Arc<dyn ReferenceSource>) -> Self {
        let loader = SeedDataLoader::new(storage.clone(), source).with_write_mode(config.seed_write_mode);
        Self { objects: SharedObjectCatalog::new(storage), loader, installer: QueryCatalogInstaller::new(engine), config }
    }

    pub fn config(&self) -> &InitConfig { &self.config }

    /// Materialize every configured container. Cannot fail.
    pub fn create_needed_objects(&self) -> bool { self.create_step().ok }

    /// Seed the config and reference containers if empty.
    pub fn load_needed_data(&self) -> bool { self.load_step().ok }

    /// Register the stream and container mappings.
    pub fn define_queryable_objects(&self) -> bool { self.define_step().ok }

    /// All three steps in order; true only if every step succeeded.
    pub fn run(&self) -> bool { self.run_report().ok() }

    pub fn run_report(&self) -> InitReport {
        info!(target: "grid_bootstrap::init", "initialization starting source='{}' containers={}", self.config.source_address, self.config.container_names.len());
        let report = InitReport { steps: vec![self.create_step(), self.load_step(), self.define_step()] };
        if report.ok() {
            info!(target: "grid_bootstrap::init", "initialization complete");
        } else {
            warn!(target: "grid_bootstrap::init", "initialization incomplete: {} error(s); a later run will retry", report.errors().len());
        }
        report
    }

    fn create_step(&self) -> StepOutcome {
        let ok = self.objects.ensure_containers(&self.config.container_names);
        StepOutcome { step: Step::CreateNeededObjects, ok, errors: Vec::new() }
    }

    fn load_step(&self) -> StepOutcome {
        match self.loader.load_seed(&self.config.config_container, &self.config.reference_container, &self.config.source_address) {
            Ok(outcome) => {
                info!(target: "grid_bootstrap::init", "load_needed_data config={:?} reference={:?}", outcome.config, outcome.reference);
                StepOutcome { step: Step::LoadNeededData, ok: true, errors: Vec::new() }
            }
            Err(e) => {
                error!(target: "grid_bootstrap::init", "load_needed_data() failed [{}]: {}", e.kind(), e);
                StepOutcome { step: Step::LoadNeededData, ok: false, errors: vec![e] }
            }
        }
    }

    fn define_step(&self) -> StepOutcome {
        let report = self.installer.install_built(installer::default_definition_set(&self.config.source_address));
        if !report.ok() {
            error!(target: "grid_bootstrap::init", "define_queryable_objects() failed for {:?}", report.failed_names());
        }
        StepOutcome { step: Step::DefineQueryableObjects, ok: report.ok(), errors: report.errors() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MappingCatalog;
    use crate::reference::NasdaqListedSource;
    use crate::storage::KvStoresRegistry;

    #[test]
    fn run_reports_each_step() {
        let reg = KvStoresRegistry::new();
        let cat = Arc::new(MappingCatalog::new());
        let c = InitializationCoordinator::new(InitConfig::new("kafka:9092"), Arc::new(reg.clone()), cat.clone(), Arc::new(NasdaqListedSource::bundled()));
        let report = c.run_report();
        assert!(report.ok(), "errors: {:?}", report.errors());
        let steps: Vec<Step> = report.steps.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![Step::CreateNeededObjects, Step::LoadNeededData, Step::DefineQueryableObjects]);
        assert_eq!(cat.len(), 8);
        assert!(reg.get_store("symbols").len() > 10);
    }

    #[test]
    fn blank_address_is_reported_not_raised() {
        let reg = KvStoresRegistry::new();
        let cat = Arc::new(MappingCatalog::new());
        let c = InitializationCoordinator::new(InitConfig::new(""), Arc::new(reg.clone()), cat.clone(), Arc::new(NasdaqListedSource::bundled()));
        assert!(c.create_needed_objects());
        assert!(!c.load_needed_data());
        assert!(!c.define_queryable_objects());
        let report = c.run_report();
        assert!(!report.ok());
        let kinds: Vec<&str> = report.steps.iter().flat_map(|s| s.errors.iter().map(|e| e.kind())).collect();
        assert_eq!(kinds, vec!["seed_transform", "catalog_definition"]);
        // Only the stream mapping needs the address; every container stays queryable
        assert_eq!(cat.len(), 7);
        assert!(cat.get("kf_trades").is_none());
        assert!(cat.resolve("symbols").is_ok());
    }
}
