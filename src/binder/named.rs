//! `:name` placeholders on top of positional statements.

use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use super::statement::{BoundParam, PreparedStatement};
use crate::core::{MarshalError, Result, SqlType};

/// SQL with named placeholders rewritten to `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    original: String,
    sql: String,
    /// Placeholder name for each position, in order.
    slots: Vec<String>,
}

impl NamedSql {
    /// Rewrite every `:name` placeholder to `?`.
    ///
    /// Placeholders inside string literals or comments are left alone, and so
    /// are `::type` casts. Mixing `:name` with positional `?` is rejected.
    pub fn parse(sql: &str) -> Result<Self> {
        let tokens = tokenize(sql)?;

        let mut rewritten = String::with_capacity(sql.len());
        let mut slots = Vec::new();
        let mut positional = 0;
        let mut i = 0;

        while i < tokens.len() {
            match (&tokens[i], tokens.get(i + 1)) {
                (Token::Colon, Some(Token::Word(word))) if word.quote_style.is_none() => {
                    slots.push(word.value.clone());
                    rewritten.push('?');
                    i += 2;
                    continue;
                }
                (token, _) if is_positional(token) => positional += 1,
                _ => {}
            }
            rewritten.push_str(&tokens[i].to_string());
            i += 1;
        }

        if positional > 0 && !slots.is_empty() {
            return Err(MarshalError::binding(format!(
                "SQL mixes {} positional and {} named placeholder(s): {}",
                positional,
                slots.len(),
                sql
            )));
        }

        Ok(Self {
            original: sql.to_string(),
            sql: rewritten,
            slots,
        })
    }

    /// Rewritten SQL with `?` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    /// Distinct names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for slot in &self.slots {
            if !names.contains(&slot.as_str()) {
                names.push(slot);
            }
        }
        names
    }

    /// 1-based positions of a name; empty if the name does not occur.
    pub fn positions(&self, name: &str) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_str() == name)
            .map(|(offset, _)| offset + 1)
            .collect()
    }
}

pub(crate) fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let dialect = GenericDialect {};
    Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|err| MarshalError::binding_caused_by(format!("Cannot tokenize SQL: {}", sql), err))
}

/// `?` or `?N`, whichever token the dialect produces for it.
pub(crate) fn is_positional(token: &Token) -> bool {
    match token {
        Token::Placeholder(placeholder) => placeholder.starts_with('?'),
        other => other.to_string() == "?",
    }
}

/// Positional statement addressed by placeholder name.
pub struct NamedStatement<S> {
    sql: NamedSql,
    statement: S,
}

impl<S: PreparedStatement> NamedStatement<S> {
    /// Pair parsed SQL with a statement prepared from [`NamedSql::sql`].
    pub fn new(sql: NamedSql, statement: S) -> Result<Self> {
        if sql.parameter_count() != statement.parameter_count() {
            return Err(MarshalError::binding(format!(
                "Statement declares {} parameters but the SQL has {} named placeholder(s)",
                statement.parameter_count(),
                sql.parameter_count()
            )));
        }
        Ok(Self { sql, statement })
    }

    pub fn named_sql(&self) -> &NamedSql {
        &self.sql
    }

    pub fn statement(&self) -> &S {
        &self.statement
    }

    pub fn into_inner(self) -> S {
        self.statement
    }

    /// Declared type of the first position carrying `name`.
    pub fn parameter_type(&self, name: &str) -> Result<SqlType> {
        let position = *self
            .positions(name)?
            .first()
            .ok_or_else(|| unknown_name(name))?;
        self.statement.parameter_type(position)
    }

    /// Bind the same parameter at every position of `name`.
    pub fn bind_name(&mut self, name: &str, param: BoundParam) -> Result<()> {
        let positions = self.positions(name)?;
        let (last, rest) = positions.split_last().ok_or_else(|| unknown_name(name))?;
        for position in rest {
            self.statement.bind(*position, param.clone())?;
        }
        self.statement.bind(*last, param)
    }

    pub fn add_batch(&mut self) -> Result<()> {
        self.statement.add_batch()
    }

    fn positions(&self, name: &str) -> Result<Vec<usize>> {
        let positions = self.sql.positions(name);
        if positions.is_empty() {
            return Err(unknown_name(name));
        }
        Ok(positions)
    }
}

fn unknown_name(name: &str) -> MarshalError {
    MarshalError::binding(format!("Unknown named parameter ':{}'", name))
}
