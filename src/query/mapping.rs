//! Typed mapping definitions.
//!
//! A `MappingDefinition` names a logical relation, says what backs it (an external
//! stream or a shared container), lists its fields and carries the codec options the
//! engine needs to decode keys and values. Definitions are built through
//! `MappingDefinitionBuilder`, validated once at `build()`, and rendered by `render()`,
//! the only place statement text is produced.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_128;

use crate::ident::{quote_identifier, quote_literal};

pub const OPT_KEY_FORMAT: &str = "keyFormat";
pub const OPT_VALUE_FORMAT: &str = "valueFormat";
pub const OPT_KEY_COMPACT_TYPE_NAME: &str = "keyCompactTypeName";
pub const OPT_VALUE_COMPACT_TYPE_NAME: &str = "valueCompactTypeName";
pub const OPT_BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const OPT_AUTO_OFFSET_RESET: &str = "auto.offset.reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Varchar,
    Boolean,
    Tinyint,
    Smallint,
    Integer,
    Bigint,
    Decimal,
    Real,
    Double,
    Date,
    Time,
    Timestamp,
    Object,
    Json,
}

impl FieldType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            FieldType::Varchar => "VARCHAR",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Tinyint => "TINYINT",
            FieldType::Smallint => "SMALLINT",
            FieldType::Integer => "INTEGER",
            FieldType::Bigint => "BIGINT",
            FieldType::Decimal => "DECIMAL",
            FieldType::Real => "REAL",
            FieldType::Double => "DOUBLE",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Object => "OBJECT",
            FieldType::Json => "JSON",
        }
    }

    /// Parse a type name, accepting the usual aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VARCHAR" | "STRING" | "TEXT" => Some(FieldType::Varchar),
            "BOOLEAN" | "BOOL" => Some(FieldType::Boolean),
            "TINYINT" => Some(FieldType::Tinyint),
            "SMALLINT" => Some(FieldType::Smallint),
            "INTEGER" | "INT" => Some(FieldType::Integer),
            "BIGINT" => Some(FieldType::Bigint),
            "DECIMAL" => Some(FieldType::Decimal),
            "REAL" => Some(FieldType::Real),
            "DOUBLE" => Some(FieldType::Double),
            "DATE" => Some(FieldType::Date),
            "TIME" => Some(FieldType::Time),
            "TIMESTAMP" => Some(FieldType::Timestamp),
            "OBJECT" => Some(FieldType::Object),
            "JSON" => Some(FieldType::Json),
            _ => None,
        }
    }
}

/// What a mapping reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackingKind {
    /// External stream (a Kafka topic).
    Kafka,
    /// Shared key/value container.
    IMap,
}

impl BackingKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            BackingKind::Kafka => "Kafka",
            BackingKind::IMap => "IMap",
        }
    }

    pub fn is_external(&self) -> bool { matches!(self, BackingKind::Kafka) }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kafka" => Some(BackingKind::Kafka),
            "imap" => Some(BackingKind::IMap),
            _ => None,
        }
    }
}

/// Encoding of a mapping's key or value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryFormat {
    /// A single scalar of the given type.
    Primitive(FieldType),
    /// A structured type registered with the engine under `type_name`.
    Compact { type_name: String },
    /// Flat JSON object, one field per top-level attribute.
    JsonFlat,
}

impl EntryFormat {
    fn format_name(&self) -> String {
        match self {
            EntryFormat::Primitive(t) => t.sql_name().to_ascii_lowercase(),
            EntryFormat::Compact { .. } => "compact".to_string(),
            EntryFormat::JsonFlat => "json-flat".to_string(),
        }
    }

    /// Recover the format from rendered options. `format_key` is `keyFormat` or `valueFormat`.
    pub fn from_options(options: &BTreeMap<String, String>, format_key: &str, type_name_key: &str) -> Option<Self> {
        let f = options.get(format_key)?;
        match f.to_ascii_lowercase().as_str() {
            "json-flat" => Some(EntryFormat::JsonFlat),
            "compact" => options.get(type_name_key).map(|t| EntryFormat::Compact { type_name: t.clone() }),
            other => FieldType::parse(other).map(EntryFormat::Primitive),
        }
    }

    /// Column type this format exposes when the mapping lists no fields.
    pub fn implied_type(&self) -> FieldType {
        match self {
            EntryFormat::Primitive(t) => *t,
            EntryFormat::Compact { .. } => FieldType::Object,
            EntryFormat::JsonFlat => FieldType::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("mapping name is empty")]
    EmptyName,
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("mapping '{mapping}': duplicate field '{field}'")]
    DuplicateField { mapping: String, field: String },
    #[error("mapping '{0}': EXTERNAL NAME is only valid for external stream mappings")]
    ExternalNameOnContainer(String),
    #[error("mapping '{mapping}': missing required option '{option}'")]
    MissingOption { mapping: String, option: String },
}

/// Immutable, validated mapping definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDefinition {
    name: String,
    external_name: Option<String>,
    kind: BackingKind,
    fields: Vec<FieldDef>,
    options: BTreeMap<String, String>,
}

impl MappingDefinition {
    pub fn builder(name: impl Into<String>, kind: BackingKind) -> MappingDefinitionBuilder {
        MappingDefinitionBuilder { name: name.into(), external_name: None, kind, fields: Vec::new(), options: BTreeMap::new() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn external_name(&self) -> Option<&str> { self.external_name.as_deref() }
    pub fn kind(&self) -> BackingKind { self.kind }
    pub fn fields(&self) -> &[FieldDef] { &self.fields }
    pub fn options(&self) -> &BTreeMap<String, String> { &self.options }
    pub fn option(&self, key: &str) -> Option<&str> { self.options.get(key).map(|s| s.as_str()) }

    pub fn key_format(&self) -> Option<EntryFormat> { EntryFormat::from_options(&self.options, OPT_KEY_FORMAT, OPT_KEY_COMPACT_TYPE_NAME) }
    pub fn value_format(&self) -> Option<EntryFormat> { EntryFormat::from_options(&self.options, OPT_VALUE_FORMAT, OPT_VALUE_COMPACT_TYPE_NAME) }

    /// Render the create-if-absent statement.
    pub fn render(&self) -> String {
        let mut out = String::from("CREATE ");
        if self.kind.is_external() { out.push_str("EXTERNAL "); }
        out.push_str("MAPPING IF NOT EXISTS ");
        out.push_str(&quote_identifier(&self.name));
        if let Some(ext) = &self.external_name {
            out.push_str(" EXTERNAL NAME ");
            out.push_str(&quote_identifier(ext));
        }
        if !self.fields.is_empty() {
            let cols: Vec<String> = self.fields.iter().map(|f| format!("{} {}", quote_identifier(&f.name), f.field_type.sql_name())).collect();
            out.push_str(" (");
            out.push_str(&cols.join(", "));
            out.push(')');
        }
        out.push_str(" TYPE ");
        out.push_str(self.kind.type_tag());
        if !self.options.is_empty() {
            let opts: Vec<String> = self.options.iter().map(|(k, v)| format!("{} = {}", quote_literal(k), quote_literal(v))).collect();
            out.push_str(" OPTIONS (");
            out.push_str(&opts.join(", "));
            out.push(')');
        }
        out
    }

    /// Stable 128-bit hash of the rendered definition.
    pub fn fingerprint(&self) -> u128 { xxh3_128(self.render().as_bytes()) }
}

impl Display for MappingDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.render()) }
}

pub struct MappingDefinitionBuilder {
    name: String,
    external_name: Option<String>,
    kind: BackingKind,
    fields: Vec<FieldDef>,
    options: BTreeMap<String, String>,
}

impl MappingDefinitionBuilder {
    pub fn external_name(mut self, remote: impl Into<String>) -> Self {
        self.external_name = Some(remote.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef { name: name.into(), field_type });
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn key_format(self, format: EntryFormat) -> Self { self.entry_format(format, OPT_KEY_FORMAT, OPT_KEY_COMPACT_TYPE_NAME) }

    pub fn value_format(self, format: EntryFormat) -> Self { self.entry_format(format, OPT_VALUE_FORMAT, OPT_VALUE_COMPACT_TYPE_NAME) }

    fn entry_format(mut self, format: EntryFormat, format_key: &str, type_name_key: &str) -> Self {
        self.options.insert(format_key.to_string(), format.format_name());
        match format {
            EntryFormat::Compact { type_name } => { self.options.insert(type_name_key.to_string(), type_name); }
            _ => { self.options.remove(type_name_key); }
        }
        self
    }

    pub fn build(self) -> Result<MappingDefinition, MappingError> {
        if self.name.trim().is_empty() { return Err(MappingError::EmptyName); }
        check_identifier(&self.name)?;
        if let Some(ext) = &self.external_name {
            if !self.kind.is_external() { return Err(MappingError::ExternalNameOnContainer(self.name)); }
            check_identifier(ext)?;
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for f in &self.fields {
            check_identifier(&f.name)?;
            if !seen.insert(f.name.as_str()) {
                return Err(MappingError::DuplicateField { mapping: self.name.clone(), field: f.name.clone() });
            }
        }
        let required: &[&str] = match self.kind {
            BackingKind::IMap => &[OPT_KEY_FORMAT, OPT_VALUE_FORMAT],
            BackingKind::Kafka => &[OPT_VALUE_FORMAT, OPT_BOOTSTRAP_SERVERS],
        };
        for opt in required {
            if self.options.get(*opt).map(|v| v.trim().is_empty()).unwrap_or(true) {
                return Err(MappingError::MissingOption { mapping: self.name.clone(), option: opt.to_string() });
            }
        }
        Ok(MappingDefinition { name: self.name, external_name: self.external_name, kind: self.kind, fields: self.fields, options: self.options })
    }
}

fn check_identifier(ident: &str) -> Result<(), MappingError> {
    if ident.trim().is_empty() || ident.trim() != ident || ident.chars().any(|c| c.is_control()) {
        return Err(MappingError::InvalidIdentifier(ident.to_string()));
    }
    Ok(())
}
