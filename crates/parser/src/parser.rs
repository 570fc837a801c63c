//! Statement parser: converts statement text into AST nodes.

use crate::ast::*;
use crate::tokenizer::{is_ident_part, unquote, unquote_ident, Scanner};
use crate::ParseError;

/// Leading words of table-level constraint definitions inside CREATE TABLE.
const CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "FOREIGN", "CONSTRAINT", "UNIQUE", "CHECK"];

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let verb = self.peek_word().to_ascii_uppercase();
        match verb.as_str() {
            "CREATE" if self.lookahead(&["CREATE", "TABLE"]) => {
                Ok(Statement::CreateTable(self.parse_create_table()?))
            }
            "INSERT" if self.lookahead(&["INSERT", "INTO"]) => {
                Ok(Statement::Insert(self.parse_insert()?))
            }
            "UPDATE" => Ok(Statement::Update(self.parse_update()?)),
            "DELETE" if self.lookahead(&["DELETE", "FROM"]) => {
                Ok(Statement::Delete(self.parse_delete()?))
            }
            _ => Ok(Statement::Other { verb }),
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn word_end(&self, start: usize) -> usize {
        let bytes = self.input.as_bytes();
        let mut end = start;
        while end < bytes.len() && is_ident_part(bytes[end]) {
            end += 1;
        }
        end
    }

    fn peek_word(&self) -> &'a str {
        let start = self.skip_from(self.pos);
        &self.input[start..self.word_end(start)]
    }

    fn skip_from(&self, mut pos: usize) -> usize {
        let bytes = self.input.as_bytes();
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    /// True when the upcoming words are exactly `words`, case-insensitively.
    fn lookahead(&self, words: &[&str]) -> bool {
        let mut pos = self.pos;
        for word in words {
            let start = self.skip_from(pos);
            let end = self.word_end(start);
            if !self.input[start..end].eq_ignore_ascii_case(word) {
                return false;
            }
            pos = end;
        }
        true
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek_word().eq_ignore_ascii_case(kw)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        self.skip_whitespace();
        let end = self.word_end(self.pos);
        let word = &self.input[self.pos..end];
        if !word.eq_ignore_ascii_case(kw) {
            return Err(ParseError::new(format!(
                "expected {kw}, found '{}'",
                self.snippet()
            )));
        }
        self.pos = end;
        Ok(())
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek_byte() == Some(b'"') {
            let close = self.input[start + 1..]
                .find('"')
                .ok_or_else(|| ParseError::new("unterminated quoted identifier"))?;
            self.pos = start + close + 2;
            return Ok(self.input[start + 1..start + 1 + close].to_string());
        }
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b',' | b'=' | b';') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::new(format!(
                "expected identifier, found '{}'",
                self.snippet()
            )));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Consume a parenthesized group and return its inner text.
    fn expect_parenthesized(&mut self, what: &str) -> Result<&'a str, ParseError> {
        self.skip_whitespace();
        if self.peek_byte() != Some(b'(') {
            return Err(ParseError::new(format!(
                "expected '(' before {what}, found '{}'",
                self.snippet()
            )));
        }
        let open = self.pos;
        let end = Scanner::new(self.input)
            .matching_paren(open)
            .ok_or_else(|| ParseError::new(format!("unterminated parenthesis in {what}")))?;
        self.pos = end;
        Ok(&self.input[open + 1..end - 1])
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError::new(format!(
                "unexpected trailing text '{}'",
                self.snippet()
            )));
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn snippet(&self) -> &'a str {
        let rest = self.rest().trim_start();
        let end = rest
            .char_indices()
            .nth(24)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    // ── CREATE TABLE ────────────────────────────────────────────────────

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        if self.at_keyword("IF") {
            self.expect_keyword("IF")?;
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
        }
        let table_name = self.expect_ident()?;
        let defs = self.expect_parenthesized("column definitions")?;
        self.expect_end()?;

        let columns = parse_column_defs(defs)?;
        if columns.is_empty() {
            return Err(ParseError::new("CREATE TABLE requires at least one column"));
        }
        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    // ── INSERT ──────────────────────────────────────────────────────────

    fn parse_insert(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table_name = self.expect_ident()?;
        let column_list = self.expect_parenthesized("column list")?;
        self.expect_keyword("VALUES")?;
        let value_list = self.expect_parenthesized("value list")?;
        self.expect_end()?;

        let columns = Scanner::new(column_list)
            .split(b',')
            .into_iter()
            .map(parse_column_name)
            .collect::<Result<Vec<_>, _>>()?;
        let values = Scanner::new(value_list)
            .split(b',')
            .into_iter()
            .map(parse_literal)
            .collect::<Result<Vec<_>, _>>()?;

        if columns.len() != values.len() {
            return Err(ParseError::new(format!(
                "INSERT has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ── UPDATE ──────────────────────────────────────────────────────────

    fn parse_update(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword("UPDATE")?;
        let table_name = self.expect_ident()?;
        self.expect_keyword("SET")?;

        let rest = self.rest();
        let (set_clause, predicate) = match Scanner::new(rest).find_keyword("WHERE") {
            Some(idx) => (&rest[..idx], parse_where(&rest[idx + "WHERE".len()..])?),
            None => (rest, Predicate::default()),
        };
        self.pos = self.input.len();

        let set_clause = set_clause.trim();
        if set_clause.is_empty() {
            return Err(ParseError::new("UPDATE requires at least one assignment"));
        }
        let assignments = Scanner::new(set_clause)
            .split(b',')
            .into_iter()
            .map(parse_assignment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            predicate,
        })
    }

    // ── DELETE ──────────────────────────────────────────────────────────

    fn parse_delete(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table_name = self.expect_ident()?;
        self.skip_whitespace();

        let predicate = if self.rest().is_empty() {
            Predicate::default()
        } else {
            self.expect_keyword("WHERE")?;
            let predicate = parse_where(self.rest())?;
            self.pos = self.input.len();
            predicate
        };
        Ok(DeleteStatement {
            table_name,
            predicate,
        })
    }
}

fn parse_column_defs(defs: &str) -> Result<Vec<ColumnDef>, ParseError> {
    let mut columns = Vec::new();
    for def in Scanner::new(defs).split(b',') {
        if def.is_empty() {
            continue;
        }
        let split_at = if def.starts_with('"') {
            def[1..].find('"').map(|idx| idx + 2).unwrap_or(def.len())
        } else {
            def.find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(def.len())
        };
        let (head, tail) = def.split_at(split_at);
        if CONSTRAINT_KEYWORDS
            .iter()
            .any(|kw| head.eq_ignore_ascii_case(kw))
        {
            continue;
        }
        columns.push(ColumnDef {
            name: parse_column_name(head)?,
            data_type: tail.trim().to_string(),
        });
    }
    Ok(columns)
}

fn parse_column_name(raw: &str) -> Result<String, ParseError> {
    let name = unquote_ident(raw);
    if name.is_empty() {
        return Err(ParseError::new("empty column name"));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '=' | '<' | '>' | '!' | '(' | ')'))
    {
        return Err(ParseError::new(format!("invalid column name '{name}'")));
    }
    Ok(name.to_string())
}

/// `NULL` (any case) → Null, `'text'` → decoded text, anything else verbatim.
pub fn parse_literal(raw: &str) -> Result<Literal, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::new("empty value"));
    }
    if raw.eq_ignore_ascii_case("NULL") {
        return Ok(Literal::Null);
    }
    if raw.starts_with('\'') {
        return unquote(raw)
            .map(Literal::String)
            .ok_or_else(|| ParseError::new(format!("unterminated string literal {raw}")));
    }
    Ok(Literal::String(raw.to_string()))
}

fn parse_assignment(raw: &str) -> Result<Assignment, ParseError> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| ParseError::new(format!("expected col=value in SET, found '{raw}'")))?;
    Ok(Assignment {
        column: parse_column_name(column)?,
        value: parse_literal(value)?,
    })
}

fn parse_where(text: &str) -> Result<Predicate, ParseError> {
    let predicate = parse_predicate(text)?;
    if predicate.is_empty() {
        return Err(ParseError::new("WHERE clause is empty"));
    }
    Ok(predicate)
}

/// Parse an `AND`-chain of `<col> IS NULL` / `<col> = <literal>` conditions.
/// Blank input yields the empty predicate. An `AND` with no condition on
/// one side is rejected rather than read as part of a literal.
pub fn parse_predicate(text: &str) -> Result<Predicate, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Predicate::default());
    }
    let mut words = text.split_ascii_whitespace();
    let is_and = |word: Option<&str>| word.is_some_and(|w| w.eq_ignore_ascii_case("AND"));
    if is_and(words.next()) || is_and(words.next_back()) {
        return Err(ParseError::new(format!("dangling AND in condition '{text}'")));
    }
    let conditions = Scanner::new(text)
        .split_keyword("AND")
        .into_iter()
        .map(parse_condition)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Predicate { conditions })
}

fn parse_condition(cond: &str) -> Result<Condition, ParseError> {
    if cond.is_empty() {
        return Err(ParseError::new("empty condition in WHERE clause"));
    }

    let words: Vec<&str> = cond.split_whitespace().collect();
    let n = words.len();
    if n >= 3
        && words[n - 2].eq_ignore_ascii_case("IS")
        && words[n - 1].eq_ignore_ascii_case("NULL")
    {
        return Ok(Condition::IsNull {
            column: parse_column_name(&words[..n - 2].join(" "))?,
        });
    }

    let Some((column, rhs)) = cond.split_once('=') else {
        return Err(ParseError::new(format!(
            "unsupported condition '{cond}'; expected col = value or col IS NULL"
        )));
    };
    let column = column.trim();
    if column.ends_with(&['<', '>', '!'][..]) {
        return Err(ParseError::new(format!("unsupported operator in condition '{cond}'")));
    }
    let value = match parse_literal(rhs)? {
        Literal::String(s) => s,
        Literal::Null => rhs.trim().to_string(),
    };
    Ok(Condition::Equals {
        column: parse_column_name(column)?,
        value,
    })
}
