//! Seed data loader
//! ----------------
//! Populates the connection-config container and the symbol reference container,
//! each only while it is empty.
//!
//! Two callers can both see "empty" and both write. Every value is a pure function of
//! the source address or the static reference listing, so the second write is
//! byte-identical to the first and the race is harmless. `SeedWriteMode::PutIfAbsent`
//! closes the window entirely by never overwriting a key.
//!
//! The phases are independent: if the config phase commits and the reference phase
//! fails, the next invocation skips config and retries only the reference rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SeedWriteMode;
use crate::constants;
use crate::error::{InitError, InitResult};
use crate::reference::{ReferenceSource, SymbolInfo, SymbolListing};
use crate::storage::{KvValue, SharedContainer, SharedStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Container was empty; this many records were written by this call. Keys a peer
    /// wrote first are not counted in `PutIfAbsent` mode.
    Seeded(usize),
    /// Container already had content and was left untouched.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub config: PhaseOutcome,
    pub reference: PhaseOutcome,
}

/// Connection settings stashed for ad-hoc stream jobs.
pub fn connection_config(source_address: &str) -> InitResult<BTreeMap<String, KvValue>> {
    let address = source_address.trim();
    if address.is_empty() {
        return Err(InitError::seed("source_address_empty", "source address must not be empty"));
    }
    let mut out = BTreeMap::new();
    out.insert(constants::BOOTSTRAP_SERVERS_CONFIG.to_string(), KvValue::from(address));
    out.insert(constants::KEY_DESERIALIZER_CONFIG.to_string(), KvValue::from(constants::STRING_DESERIALIZER));
    out.insert(constants::VALUE_DESERIALIZER_CONFIG.to_string(), KvValue::from(constants::STRING_DESERIALIZER));
    Ok(out)
}

/// Turn upstream listings into symbol records keyed by symbol.
pub fn reference_records(rows: &BTreeMap<String, SymbolListing>) -> InitResult<BTreeMap<String, KvValue>> {
    let mut out = BTreeMap::new();
    for (symbol, listing) in rows {
        let info = SymbolInfo::from(listing);
        let json = serde_json::to_value(&info)
            .map_err(|e| InitError::seed("symbol_encode".to_string(), format!("symbol '{}': {}", symbol, e)))?;
        out.insert(symbol.clone(), KvValue::Json(json));
    }
    Ok(out)
}

pub struct SeedDataLoader {
    storage: Arc<dyn SharedStorage>,
    source: Arc<dyn ReferenceSource>,
    mode: SeedWriteMode,
}

impl SeedDataLoader {
    pub fn new(storage: Arc<dyn SharedStorage>, source: Arc<dyn ReferenceSource>) -> Self {
        Self { storage, source, mode: SeedWriteMode::default() }
    }

    pub fn with_write_mode(mut self, mode: SeedWriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed both containers if empty. The first error aborts the call; anything an
    /// earlier phase committed stays committed.
    pub fn load_seed(&self, config_container: &str, reference_container: &str, source_address: &str) -> InitResult<SeedOutcome> {
        let config = self.storage.get_or_create(config_container);
        let reference = self.storage.get_or_create(reference_container);

        let config_outcome = self.seed_if_empty(config.as_ref(), || connection_config(source_address))?;
        let reference_outcome = self.seed_if_empty(reference.as_ref(), || {
            let rows = self.source.load()?;
            debug!(target: "grid_bootstrap::seed", "read {} rows from {}", rows.len(), self.source.describe());
            reference_records(&rows)
        })?;
        Ok(SeedOutcome { config: config_outcome, reference: reference_outcome })
    }

    fn seed_if_empty<F>(&self, container: &dyn SharedContainer, records: F) -> InitResult<PhaseOutcome>
    where
        F: FnOnce() -> InitResult<BTreeMap<String, KvValue>>,
    {
        let name = container.name().to_string();
        let empty = container.is_empty().map_err(|e| storage_error(&name, "is_empty", e))?;
        if !empty {
            debug!(target: "grid_bootstrap::seed", "Skip loading '{}', not empty", name);
            return Ok(PhaseOutcome::Skipped);
        }
        let entries = records()?;
        let count = match self.mode {
            SeedWriteMode::Overwrite => {
                let count = entries.len();
                container.put_all(entries).map_err(|e| storage_error(&name, "put_all", e))?;
                count
            }
            SeedWriteMode::PutIfAbsent => {
                let offered = entries.len();
                let mut kept = 0usize;
                for (k, v) in entries {
                    if container.put_if_absent(&k, v).map_err(|e| storage_error(&name, "put_if_absent", e))?.is_some() { kept += 1; }
                }
                if kept > 0 { debug!(target: "grid_bootstrap::seed", "'{}': {} keys already written by a peer", name, kept); }
                offered - kept
            }
        };
        info!(target: "grid_bootstrap::seed", "Loaded {} into '{}'", count, name);
        Ok(PhaseOutcome::Seeded(count))
    }
}

fn storage_error(container: &str, op: &str, err: anyhow::Error) -> InitError {
    InitError::storage("storage_op_failed".to_string(), format!("{} on '{}': {:#}", op, container, err))
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod seed_tests;
