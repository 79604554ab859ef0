//! Identifier normalization and quoting
//! ------------------------------------
//! Single source of truth for how mapping names, field names and option values are
//! written into mapping statements and read back out of them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words the mapping grammar reserves. An identifier spelled like one of these
/// must be double-quoted; `timestamp` is the one the default mappings hit.
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "and", "as", "asc", "between", "by", "case", "cast", "create", "current_date",
        "current_time", "current_timestamp", "date", "default", "delete", "desc", "distinct",
        "drop", "else", "end", "exists", "external", "false", "from", "group", "having", "if",
        "in", "insert", "interval", "into", "is", "join", "like", "limit", "mapping", "name",
        "not", "null", "offset", "on", "options", "or", "order", "select", "set", "table",
        "time", "timestamp", "true", "type", "union", "update", "values", "view", "where", "with",
    ]
    .into_iter()
    .collect()
});

static PLAIN_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"));

pub fn is_reserved_word(ident: &str) -> bool {
    RESERVED_WORDS.contains(ident.to_ascii_lowercase().as_str())
}

/// True when `ident` survives an unquoted round trip: lowercase, starts with a letter or
/// underscore, and is not reserved.
pub fn is_plain_identifier(ident: &str) -> bool {
    PLAIN_IDENT.is_match(ident) && !is_reserved_word(ident)
}

/// Render an identifier for a statement. Plain identifiers pass through; everything
/// else (reserved words, mixed case, dots, dashes) is double-quoted with embedded
/// quotes doubled.
pub fn quote_identifier(ident: &str) -> String {
    if is_plain_identifier(ident) {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Render a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Normalize an identifier according to SQL rules:
/// - If enclosed in double-quotes, strip quotes and preserve case
/// - Otherwise, convert to lowercase for case-insensitive matching
pub fn normalize_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Inverse of `quote_literal`: strip one level of single quotes if present.
pub fn unquote_literal(value: &str) -> String {
    let t = value.trim();
    if t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'') {
        t[1..t.len() - 1].replace("''", "'")
    } else {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_are_quoted() {
        assert_eq!(quote_identifier("timestamp"), "\"timestamp\"");
        assert_eq!(quote_identifier("TimeStamp"), "\"TimeStamp\"");
        assert_eq!(quote_identifier("symbol"), "symbol");
        assert_eq!(quote_identifier("__key"), "__key");
    }

    #[test]
    fn mixed_case_and_punctuation_are_quoted() {
        assert_eq!(quote_identifier("AggregateQuery_results"), "\"AggregateQuery_results\"");
        assert_eq!(quote_identifier("sys.config"), "\"sys.config\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn normalize_inverts_quote() {
        for name in ["timestamp", "AggregateQuery_results", "plain", "a\"b", "kf_trades"] {
            assert_eq!(normalize_identifier(&quote_identifier(name)), name);
        }
    }

    #[test]
    fn literal_round_trip() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(unquote_literal("'it''s'"), "it's");
        assert_eq!(unquote_literal("bare"), "bare");
    }
}
