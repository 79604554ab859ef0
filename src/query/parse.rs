//! Mapping statement parser.
//!
//! Grammar handled:
//! - `CREATE [OR REPLACE] [EXTERNAL] MAPPING [IF NOT EXISTS] <name> [EXTERNAL NAME <remote>]
//!   [( <field> <type> [, ...] )] TYPE <kind> [OPTIONS ( '<k>' = '<v>' [, ...] )]`
//! - `DROP MAPPING [IF EXISTS] <name>`
//!
//! Identifiers go through `ident::normalize_identifier`, so a rendered definition
//! parses back to an equal one.

use anyhow::{anyhow, bail, Result};

use crate::ident::{normalize_identifier, unquote_literal};
use crate::query::mapping::{BackingKind, FieldType, MappingDefinition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingStatement {
    Create { definition: MappingDefinition, if_not_exists: bool, or_replace: bool },
    Drop { name: String, if_exists: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    /// Bare word or double-quoted identifier, kept verbatim (quotes included)
    Word(String),
    /// Single-quoted literal, kept verbatim
    Literal(String),
    LParen,
    RParen,
    Comma,
    Eq,
}

impl Tok {
    fn is_kw(&self, kw: &str) -> bool {
        matches!(self, Tok::Word(w) if !w.starts_with('"') && w.eq_ignore_ascii_case(kw))
    }
}

/// Strip SQL comments from the input while preserving content inside string literals.
/// Supported comment styles:
/// - Line comments starting with `--` until end of line
/// - Block comments delimited by `/* ... */`, nested
pub fn strip_sql_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;
    let mut in_squote = false;
    let mut in_dquote = false;
    let mut block_depth: i32 = 0;
    let mut line_comment = false;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        if line_comment {
            if ch == '\n' { out.push('\n'); line_comment = false; }
            i += 1;
            continue;
        }
        if block_depth > 0 {
            if ch == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' { block_depth += 1; i += 2; continue; }
            if ch == '*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' { block_depth -= 1; i += 2; continue; }
            i += 1;
            continue;
        }
        if !in_dquote && ch == '\'' { in_squote = !in_squote; }
        else if !in_squote && ch == '"' { in_dquote = !in_dquote; }
        else if !in_squote && !in_dquote {
            if ch == '-' && i + 1 < bytes.len() && bytes[i + 1] == b'-' { line_comment = true; i += 2; continue; }
            if ch == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' { block_depth = 1; i += 2; continue; }
        }
        // Copy the full UTF-8 sequence starting here
        let len = utf8_len(bytes[i]);
        out.push_str(&input[i..i + len]);
        i += len;
    }
    out
}

fn utf8_len(first: u8) -> usize {
    match first {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

fn tokenize(s: &str) -> Result<Vec<Tok>> {
    let b = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < b.len() {
        let ch = b[i];
        if ch.is_ascii_whitespace() || ch == b';' { i += 1; continue; }
        match ch {
            b'(' => { out.push(Tok::LParen); i += 1; }
            b')' => { out.push(Tok::RParen); i += 1; }
            b',' => { out.push(Tok::Comma); i += 1; }
            b'=' => { out.push(Tok::Eq); i += 1; }
            b'\'' | b'"' => {
                // Quoted run; a doubled quote is an escaped quote
                let q = ch;
                let start = i;
                i += 1;
                loop {
                    if i >= b.len() { bail!("unterminated quoted text starting at offset {}", start); }
                    if b[i] == q {
                        if i + 1 < b.len() && b[i + 1] == q { i += 2; continue; }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                let text = s[start..i].to_string();
                out.push(if q == b'\'' { Tok::Literal(text) } else { Tok::Word(text) });
            }
            _ => {
                let start = i;
                while i < b.len() && !b[i].is_ascii_whitespace() && !matches!(b[i], b'(' | b')' | b',' | b'=' | b'\'' | b'"' | b';') { i += 1; }
                out.push(Tok::Word(s[start..i].to_string()));
            }
        }
    }
    Ok(out)
}

struct Cursor {
    toks: Vec<Tok>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Tok> { self.toks.get(self.pos) }

    fn next(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() { self.pos += 1; }
        t
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.peek().map(|t| t.is_kw(kw)).unwrap_or(false) { self.pos += 1; true } else { false }
    }

    fn eat_kws(&mut self, kws: &[&str]) -> bool {
        let save = self.pos;
        for kw in kws {
            if !self.eat_kw(kw) { self.pos = save; return false; }
        }
        true
    }

    fn expect_kw(&mut self, kw: &str) -> Result<()> {
        if self.eat_kw(kw) { Ok(()) } else { Err(anyhow!("expected {} near {}", kw, self.near())) }
    }

    fn expect(&mut self, tok: Tok) -> Result<()> {
        match self.next() {
            Some(t) if t == tok => Ok(()),
            other => Err(anyhow!("expected {:?}, found {:?}", tok, other)),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Tok::Word(w)) => Ok(normalize_identifier(&w)),
            other => Err(anyhow!("expected {}, found {:?}", what, other)),
        }
    }

    fn near(&self) -> String {
        match self.peek() {
            Some(Tok::Word(w)) | Some(Tok::Literal(w)) => format!("'{}'", w),
            Some(t) => format!("{:?}", t),
            None => "end of statement".to_string(),
        }
    }
}

/// Parse one mapping statement.
pub fn parse_mapping_statement(sql: &str) -> Result<MappingStatement> {
    let cleaned = strip_sql_comments(sql);
    let mut c = Cursor { toks: tokenize(&cleaned)?, pos: 0 };
    let stmt = if c.eat_kw("CREATE") {
        parse_create(&mut c)?
    } else if c.eat_kw("DROP") {
        c.expect_kw("MAPPING")?;
        let if_exists = c.eat_kws(&["IF", "EXISTS"]);
        let name = c.ident("mapping name")?;
        MappingStatement::Drop { name, if_exists }
    } else {
        bail!("unsupported statement near {}", c.near());
    };
    if c.peek().is_some() { bail!("unexpected trailing input near {}", c.near()); }
    Ok(stmt)
}

fn parse_create(c: &mut Cursor) -> Result<MappingStatement> {
    let or_replace = c.eat_kws(&["OR", "REPLACE"]);
    // EXTERNAL is accepted for either backing kind
    c.eat_kw("EXTERNAL");
    c.expect_kw("MAPPING")?;
    let if_not_exists = c.eat_kws(&["IF", "NOT", "EXISTS"]);
    if if_not_exists && or_replace { bail!("OR REPLACE and IF NOT EXISTS cannot be combined"); }
    let name = c.ident("mapping name")?;

    let mut external_name: Option<String> = None;
    if c.eat_kws(&["EXTERNAL", "NAME"]) {
        external_name = Some(c.ident("external name")?);
    }

    let mut fields: Vec<(String, FieldType)> = Vec::new();
    if c.peek() == Some(&Tok::LParen) {
        c.next();
        loop {
            let fname = c.ident("field name")?;
            let tname = match c.next() {
                Some(Tok::Word(w)) => w,
                other => bail!("expected type for field '{}', found {:?}", fname, other),
            };
            let ftype = FieldType::parse(&tname).ok_or_else(|| anyhow!("unknown type '{}' for field '{}'", tname, fname))?;
            fields.push((fname, ftype));
            match c.next() {
                Some(Tok::Comma) => continue,
                Some(Tok::RParen) => break,
                other => bail!("expected ',' or ')' in field list, found {:?}", other),
            }
        }
    }

    c.expect_kw("TYPE")?;
    let kind_word = match c.next() {
        Some(Tok::Word(w)) => w,
        other => bail!("expected mapping type, found {:?}", other),
    };
    let kind = BackingKind::parse(&kind_word).ok_or_else(|| anyhow!("unknown mapping type '{}'", kind_word))?;

    let mut builder = MappingDefinition::builder(name, kind);
    if let Some(ext) = external_name { builder = builder.external_name(ext); }
    for (fname, ftype) in fields { builder = builder.field(fname, ftype); }

    if c.eat_kw("OPTIONS") {
        c.expect(Tok::LParen)?;
        if c.peek() == Some(&Tok::RParen) {
            c.next();
        } else {
            loop {
                let key = match c.next() {
                    Some(Tok::Literal(l)) => unquote_literal(&l),
                    other => bail!("expected quoted option key, found {:?}", other),
                };
                c.expect(Tok::Eq)?;
                let value = match c.next() {
                    Some(Tok::Literal(l)) => unquote_literal(&l),
                    other => bail!("expected quoted value for option '{}', found {:?}", key, other),
                };
                builder = builder.option(key, value);
                match c.next() {
                    Some(Tok::Comma) => continue,
                    Some(Tok::RParen) => break,
                    other => bail!("expected ',' or ')' in OPTIONS, found {:?}", other),
                }
            }
        }
    }

    let definition = builder.build()?;
    Ok(MappingStatement::Create { definition, if_not_exists, or_replace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::mapping::{EntryFormat, OPT_BOOTSTRAP_SERVERS};

    #[test]
    fn rendered_definitions_parse_back_equal() {
        let defs = vec![
            MappingDefinition::builder("alertsMaxVolume", BackingKind::IMap)
                .field("__key", FieldType::Bigint)
                .field("timestamp", FieldType::Varchar)
                .key_format(EntryFormat::Primitive(FieldType::Bigint))
                .value_format(EntryFormat::JsonFlat)
                .build()
                .unwrap(),
            MappingDefinition::builder("kf_trades", BackingKind::Kafka)
                .external_name("trades")
                .field("timestamp", FieldType::Bigint)
                .value_format(EntryFormat::JsonFlat)
                .option(OPT_BOOTSTRAP_SERVERS, "host-a:9092,host-b:9092")
                .option("odd", "it's")
                .build()
                .unwrap(),
        ];
        for def in defs {
            match parse_mapping_statement(&def.render()).unwrap() {
                MappingStatement::Create { definition, if_not_exists, or_replace } => {
                    assert_eq!(definition, def);
                    assert!(if_not_exists);
                    assert!(!or_replace);
                }
                other => panic!("expected CREATE, got {:?}", other),
            }
        }
    }

    #[test]
    fn comments_and_case_are_tolerated() {
        let sql = "-- config\ncreate mapping if not exists kafka_config /* no fields */ type imap options ('keyFormat'='varchar', 'valueFormat'='varchar');";
        match parse_mapping_statement(sql).unwrap() {
            MappingStatement::Create { definition, .. } => {
                assert_eq!(definition.name(), "kafka_config");
                assert_eq!(definition.kind(), BackingKind::IMap);
                assert!(definition.fields().is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unquoted_names_fold_to_lowercase() {
        let sql = "CREATE MAPPING Symbols TYPE IMap OPTIONS ('keyFormat'='varchar','valueFormat'='json-flat')";
        match parse_mapping_statement(sql).unwrap() {
            MappingStatement::Create { definition, if_not_exists, .. } => {
                assert_eq!(definition.name(), "symbols");
                assert!(!if_not_exists);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn drop_statement() {
        assert_eq!(
            parse_mapping_statement("DROP MAPPING IF EXISTS \"jobControl\"").unwrap(),
            MappingStatement::Drop { name: "jobControl".into(), if_exists: true }
        );
    }

    #[test]
    fn errors_are_reported() {
        assert!(parse_mapping_statement("SELECT 1").is_err());
        assert!(parse_mapping_statement("CREATE MAPPING m (a NOPE) TYPE IMap").unwrap_err().to_string().contains("unknown type 'NOPE'"));
        assert!(parse_mapping_statement("CREATE MAPPING m TYPE Nowhere").unwrap_err().to_string().contains("unknown mapping type"));
        assert!(parse_mapping_statement("CREATE MAPPING m TYPE IMap OPTIONS ('keyFormat' = 'varchar'").is_err());
        assert!(parse_mapping_statement("CREATE MAPPING 'm' TYPE IMap").is_err());
        // validation runs through the builder
        let err = parse_mapping_statement("CREATE MAPPING m TYPE IMap OPTIONS ('keyFormat'='varchar')").unwrap_err();
        assert!(err.to_string().contains("valueFormat"));
    }
}
