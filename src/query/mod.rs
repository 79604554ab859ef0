//! Declarative query engine collaborator.
//!
//! The bootstrap only ever issues mapping DDL, so the engine surface is a single
//! `execute`. `mapping` holds the typed definitions and their renderer, `parse` reads
//! the statements back, and `catalog` is the in-process engine that keeps the
//! registered mappings.

use anyhow::Result;

pub mod catalog;
pub mod mapping;
pub mod parse;

pub use catalog::{CatalogEntry, MappingCatalog};
pub use mapping::{BackingKind, EntryFormat, FieldDef, FieldType, MappingDefinition, MappingDefinitionBuilder, MappingError};
pub use parse::{parse_mapping_statement, MappingStatement};

pub trait QueryEngine: Send + Sync {
    /// Run one statement. Blocks until the engine accepts or rejects it.
    fn execute(&self, statement: &str) -> Result<()>;
}
