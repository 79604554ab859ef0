//! Reference lookup data
//! ---------------------
//! The upstream dataset the seed loader turns into symbol records: stock symbol to
//! (display name, market category, financial status). Sources are read once,
//! synchronously, at seed time.
//!
//! `NasdaqListedSource` parses the exchange's pipe-delimited listing file:
//! a header row, one row per symbol, and an optional `File Creation Time` trailer.
//! Test issues are skipped. A small listing ships with the crate as the default.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InitError, InitResult};

/// Listing bundled with the crate.
pub const BUNDLED_NASDAQ_LISTED: &str = include_str!("../data/nasdaqlisted.txt");

const TRAILER_PREFIX: &str = "File Creation Time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCategory {
    /// No tier reported
    Normal,
    GlobalSelect,
    GlobalMarket,
    CapitalMarket,
}

impl MarketCategory {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "" => Some(MarketCategory::Normal),
            "Q" => Some(MarketCategory::GlobalSelect),
            "G" => Some(MarketCategory::GlobalMarket),
            "S" => Some(MarketCategory::CapitalMarket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    /// Not deficient, delinquent or bankrupt
    Current,
    Deficient,
    Delinquent,
    Bankrupt,
    DeficientBankrupt,
    DeficientDelinquent,
    DelinquentBankrupt,
    DeficientDelinquentBankrupt,
}

impl FinancialStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "" | "N" => Some(FinancialStatus::Current),
            "D" => Some(FinancialStatus::Deficient),
            "E" => Some(FinancialStatus::Delinquent),
            "Q" => Some(FinancialStatus::Bankrupt),
            "G" => Some(FinancialStatus::DeficientBankrupt),
            "H" => Some(FinancialStatus::DeficientDelinquent),
            "J" => Some(FinancialStatus::DelinquentBankrupt),
            "K" => Some(FinancialStatus::DeficientDelinquentBankrupt),
            _ => None,
        }
    }
}

/// One upstream row: (display name, market category, financial status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolListing(pub String, pub MarketCategory, pub FinancialStatus);

/// Seed record stored under the symbol in the reference container. Field order is
/// fixed so the same listing always serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub display_name: String,
    pub market_category: MarketCategory,
    pub financial_status: FinancialStatus,
}

impl From<&SymbolListing> for SymbolInfo {
    fn from(l: &SymbolListing) -> Self {
        Self { display_name: l.0.clone(), market_category: l.1, financial_status: l.2 }
    }
}

impl Display for SymbolInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymbolInfo [displayName={}, marketCategory={:?}, financialStatus={:?}]", self.display_name, self.market_category, self.financial_status)
    }
}

pub trait ReferenceSource: Send + Sync {
    /// Short description for log lines.
    fn describe(&self) -> String;
    fn load(&self) -> InitResult<BTreeMap<String, SymbolListing>>;
}

/// Fixed in-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceSource {
    rows: BTreeMap<String, SymbolListing>,
}

impl StaticReferenceSource {
    pub fn new(rows: BTreeMap<String, SymbolListing>) -> Self { Self { rows } }

    pub fn with(mut self, symbol: &str, name: &str, category: MarketCategory, status: FinancialStatus) -> Self {
        self.rows.insert(symbol.to_string(), SymbolListing(name.to_string(), category, status));
        self
    }
}

impl ReferenceSource for StaticReferenceSource {
    fn describe(&self) -> String { format!("static({} rows)", self.rows.len()) }
    fn load(&self) -> InitResult<BTreeMap<String, SymbolListing>> { Ok(self.rows.clone()) }
}

/// Pipe-delimited exchange listing text.
#[derive(Debug, Clone)]
pub struct NasdaqListedSource {
    text: String,
}

impl NasdaqListedSource {
    pub fn new(text: impl Into<String>) -> Self { Self { text: text.into() } }

    pub fn bundled() -> Self { Self::new(BUNDLED_NASDAQ_LISTED) }
}

impl Default for NasdaqListedSource {
    fn default() -> Self { Self::bundled() }
}

impl ReferenceSource for NasdaqListedSource {
    fn describe(&self) -> String { "nasdaqlisted".to_string() }

    fn load(&self) -> InitResult<BTreeMap<String, SymbolListing>> {
        parse_nasdaq_listed(&self.text)
    }
}

/// Parse the listing. Columns are located by header name, so column order may vary.
pub fn parse_nasdaq_listed(text: &str) -> InitResult<BTreeMap<String, SymbolListing>> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines.next().ok_or_else(|| InitError::seed("reference_empty", "reference listing has no header row"))?;
    let cols: Vec<&str> = header.split('|').map(|c| c.trim()).collect();
    let find = |name: &str| -> InitResult<usize> {
        cols.iter().position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| InitError::seed("reference_header".to_string(), format!("reference listing header missing column '{}'", name)))
    };
    let i_symbol = find("Symbol")?;
    let i_name = find("Security Name")?;
    let i_category = find("Market Category")?;
    let i_status = find("Financial Status")?;
    let i_test = cols.iter().position(|c| c.eq_ignore_ascii_case("Test Issue"));

    let mut out = BTreeMap::new();
    let mut skipped = 0usize;
    for (idx, line) in lines {
        if line.starts_with(TRAILER_PREFIX) { break; }
        let fields: Vec<&str> = line.split('|').collect();
        let lineno = idx + 1;
        let field = |i: usize| column(&fields, i, lineno, cols.len());
        if let Some(t) = i_test {
            if field(t)?.eq_ignore_ascii_case("Y") { skipped += 1; continue; }
        }
        let symbol = field(i_symbol)?;
        if symbol.is_empty() {
            return Err(InitError::seed("reference_row".to_string(), format!("line {}: empty symbol", lineno)));
        }
        let category_code = field(i_category)?;
        let category = MarketCategory::from_code(category_code)
            .ok_or_else(|| InitError::seed("reference_row".to_string(), format!("line {}: unknown market category '{}' for {}", lineno, category_code, symbol)))?;
        let status_code = field(i_status)?;
        let status = FinancialStatus::from_code(status_code)
            .ok_or_else(|| InitError::seed("reference_row".to_string(), format!("line {}: unknown financial status '{}' for {}", lineno, status_code, symbol)))?;
        out.insert(symbol.to_string(), SymbolListing(field(i_name)?.to_string(), category, status));
    }
    debug!(target: "grid_bootstrap::seed", "parsed {} listings, skipped {} test issues", out.len(), skipped);
    Ok(out)
}

fn column<'a>(fields: &[&'a str], i: usize, lineno: usize, expected: usize) -> InitResult<&'a str> {
    fields.get(i).map(|s| s.trim())
        .ok_or_else(|| InitError::seed("reference_row".to_string(), format!("line {}: expected {} fields, found {}", lineno, expected, fields.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_listing_parses_and_skips_test_issues() {
        let rows = NasdaqListedSource::bundled().load().unwrap();
        assert!(rows.contains_key("AAPL"));
        assert!(!rows.contains_key("ZAZZT"));
        assert!(!rows.contains_key("ZXZZT"));
        let aehr = &rows["AEHR"];
        assert_eq!(aehr.1, MarketCategory::CapitalMarket);
        assert_eq!(aehr.2, FinancialStatus::Deficient);
    }

    #[test]
    fn columns_found_by_header_name() {
        let text = "Financial Status|Symbol|Market Category|Security Name\nN|AAA||Alpha Corp\n";
        let rows = parse_nasdaq_listed(text).unwrap();
        assert_eq!(rows["AAA"], SymbolListing("Alpha Corp".into(), MarketCategory::Normal, FinancialStatus::Current));
    }

    #[test]
    fn malformed_rows_are_seed_transform_errors() {
        let err = parse_nasdaq_listed("Symbol|Security Name|Market Category|Financial Status\nAAA|Alpha|Z|N\n").unwrap_err();
        assert_eq!(err.kind(), "seed_transform");
        assert!(err.message().contains("unknown market category 'Z'"));

        let err = parse_nasdaq_listed("Symbol|Security Name|Market Category|Financial Status\nAAA|Alpha\n").unwrap_err();
        assert!(err.message().contains("line 2"));

        let err = parse_nasdaq_listed("Symbol|Name\n").unwrap_err();
        assert_eq!(err.code_str(), "reference_header");

        assert!(parse_nasdaq_listed("").is_err());
    }

    #[test]
    fn symbol_info_json_shape() {
        let info = SymbolInfo::from(&SymbolListing("Alpha Corp".into(), MarketCategory::Normal, FinancialStatus::Current));
        let s = serde_json::to_string(&info).unwrap();
        assert_eq!(s, r#"{"displayName":"Alpha Corp","marketCategory":"NORMAL","financialStatus":"CURRENT"}"#);
    }
}
