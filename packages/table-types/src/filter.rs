//! Filter expressions for table queries.
//!
//! Filters are equality predicates joined by `and`, written in the OData
//! subset the service accepts:
//!
//! ```text
//! (__version eq 'AAAAAAAAB9E=') and (__createdAt eq datetime'2024-05-01T10:00:00.123Z')
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::TypesError;

/// Right-hand side of an equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    DateTime(DateTime<Utc>),
    Number(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Compares the literal against a JSON field value.
    ///
    /// Datetime literals compare as instants against RFC 3339 strings.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Literal::Null => actual.is_null(),
            Literal::String(expected) => actual.as_str() == Some(expected.as_str()),
            Literal::DateTime(expected) => actual
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|ts| ts.with_timezone(&Utc) == *expected)
                .unwrap_or(false),
            Literal::Number(expected) => actual.as_f64() == Some(*expected),
            Literal::Bool(expected) => actual.as_bool() == Some(*expected),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::DateTime(ts) => write!(f, "datetime'{}'", crate::format_timestamp(ts)),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<&String> for Literal {
    fn from(value: &String) -> Self {
        Literal::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::DateTime(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field eq value`
    Eq { field: String, value: Literal },
    /// Conjunction of every child.
    And(Vec<Filter>),
}

impl Filter {
    /// Combines two filters with `and`, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Filter {
        let mut children = match self {
            Filter::And(children) => children,
            single => vec![single],
        };
        match other {
            Filter::And(more) => children.extend(more),
            single => children.push(single),
        }
        Filter::And(children)
    }

    /// Evaluates the filter against a JSON row. Missing fields read as null.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        match self {
            Filter::Eq { field, value } => value.matches(row.get(field).unwrap_or(&Value::Null)),
            Filter::And(children) => children.iter().all(|c| c.matches(row)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { field, value } => write!(f, "({} eq {})", field, value),
            Filter::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{}", child)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Filter {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let filter = parser.expression()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(filter)
    }
}

/// Field reference returned by [`field`], used to build predicates.
#[derive(Debug, Clone)]
pub struct FieldRef {
    name: String,
}

impl FieldRef {
    /// Builds `name eq value`.
    pub fn eq(self, value: impl Into<Literal>) -> Filter {
        Filter::Eq {
            field: self.name,
            value: value.into(),
        }
    }
}

/// Starts a predicate on the named field.
pub fn field(name: impl Into<String>) -> FieldRef {
    FieldRef { name: name.into() }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> TypesError {
        TypesError::InvalidFilter {
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes `keyword` (case-insensitive) if it is followed by a word boundary.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        let rest = self.rest();
        if rest.len() < keyword.len() || !rest.is_char_boundary(keyword.len()) {
            return false;
        }
        let (head, tail) = rest.split_at(keyword.len());
        let boundary = tail
            .chars()
            .next()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
        if head.eq_ignore_ascii_case(keyword) && boundary {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn expression(&mut self) -> Result<Filter, TypesError> {
        let first = self.term()?;
        let mut children = vec![first];
        while self.eat_keyword("and") {
            children.push(self.term()?);
        }
        if children.len() == 1 {
            Ok(children.remove(0))
        } else {
            Ok(children
                .into_iter()
                .reduce(Filter::and)
                .unwrap_or(Filter::And(Vec::new())))
        }
    }

    fn term(&mut self) -> Result<Filter, TypesError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.pos += 1;
            let inner = self.expression()?;
            self.skip_whitespace();
            if self.peek() != Some(')') {
                return Err(self.error("expected ')'"));
            }
            self.pos += 1;
            return Ok(inner);
        }
        let name = self.identifier()?;
        if !self.eat_keyword("eq") {
            return Err(self.error("expected 'eq'"));
        }
        let value = self.literal()?;
        Ok(Filter::Eq { field: name, value })
    }

    fn identifier(&mut self) -> Result<String, TypesError> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error("expected field name"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn quoted(&mut self) -> Result<String, TypesError> {
        // Caller guarantees the opening quote.
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = self.rest();
            match rest.find('\'') {
                None => return Err(self.error("unterminated string literal")),
                Some(i) => {
                    out.push_str(&rest[..i]);
                    self.pos += i + 1;
                    if self.peek() == Some('\'') {
                        out.push('\'');
                        self.pos += 1;
                    } else {
                        return Ok(out);
                    }
                }
            }
        }
    }

    fn literal(&mut self) -> Result<Literal, TypesError> {
        self.skip_whitespace();
        if self.peek() == Some('\'') {
            return Ok(Literal::String(self.quoted()?));
        }
        if self.eat_keyword("datetime") {
            if self.peek() != Some('\'') {
                return Err(self.error("expected quoted datetime"));
            }
            let start = self.pos;
            let text = self.quoted()?;
            let ts = DateTime::parse_from_rfc3339(&text).map_err(|e| TypesError::InvalidFilter {
                position: start,
                message: format!("invalid datetime '{}': {}", text, e),
            })?;
            return Ok(Literal::DateTime(ts.with_timezone(&Utc)));
        }
        if self.eat_keyword("true") {
            return Ok(Literal::Bool(true));
        }
        if self.eat_keyword("false") {
            return Ok(Literal::Bool(false));
        }
        if self.eat_keyword("null") {
            return Ok(Literal::Null);
        }
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .map_or(rest.len(), |(i, _)| i);
        let number: f64 = rest[..len]
            .parse()
            .map_err(|_| self.error("expected literal"))?;
        self.pos += len;
        Ok(Literal::Number(number))
    }
}
