//! Placeholder types derived from a mapping descriptor.

use sqlparser::tokenizer::Token;

use super::named::{is_positional, tokenize};
use crate::core::{Result, SqlType};
use crate::mapping::{MappingDescriptor, persisted_sql_type};

/// Declared SQL type for every placeholder of a statement, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    types: Vec<SqlType>,
}

/// Significant token: whitespace dropped, `:name` folded into one placeholder.
enum Sig {
    Placeholder,
    Word(String),
    Other(Token),
}

impl ParameterMetadata {
    pub fn new(types: Vec<SqlType>) -> Self {
        Self { types }
    }

    /// Infer placeholder types for `sql` against the descriptor's columns.
    ///
    /// - `INSERT INTO t (a, b) VALUES (?, ?)` maps placeholders to the column list by position;
    /// - `col <op> ?` and `? <op> col` take the type of `col`;
    /// - anything else is VARCHAR.
    ///
    /// Join columns are VARCHAR here; use [`infer_with_targets`](Self::infer_with_targets)
    /// to type them from the target entity's id.
    pub fn infer(sql: &str, descriptor: &MappingDescriptor) -> Result<Self> {
        Self::infer_with_targets(sql, descriptor, |_| None)
    }

    /// Like [`infer`](Self::infer), with `target_id_type` giving the id type of
    /// an association's target entity.
    pub fn infer_with_targets<F>(
        sql: &str,
        descriptor: &MappingDescriptor,
        target_id_type: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<SqlType>,
    {
        let tokens = significant_tokens(sql)?;

        let columns = insert_columns(&tokens);
        let mut types = Vec::new();
        let mut tuple_position = 0;
        let mut depth = 0usize;
        let mut in_values = false;

        for (i, token) in tokens.iter().enumerate() {
            match token {
                Sig::Word(word) if word.eq_ignore_ascii_case("values") => in_values = true,
                Sig::Other(Token::LParen) => {
                    depth += 1;
                    if in_values && depth == 1 {
                        tuple_position = 0;
                    }
                }
                Sig::Other(Token::RParen) => depth = depth.saturating_sub(1),
                Sig::Other(Token::Comma) if in_values && depth == 1 => tuple_position += 1,
                Sig::Placeholder => {
                    let column = match (&columns, in_values) {
                        (Some(columns), true) => columns.get(tuple_position).cloned(),
                        _ => compared_column(&tokens, i),
                    };
                    types.push(
                        column
                            .and_then(|column| column_type(descriptor, &column, &target_id_type))
                            .unwrap_or(SqlType::VarChar),
                    );
                }
                _ => {}
            }
        }

        Ok(Self { types })
    }

    pub fn parameter_count(&self) -> usize {
        self.types.len()
    }

    /// 1-based.
    pub fn parameter_type(&self, index: usize) -> Option<SqlType> {
        index.checked_sub(1).and_then(|i| self.types.get(i)).copied()
    }

    pub fn types(&self) -> &[SqlType] {
        &self.types
    }

    pub fn into_types(self) -> Vec<SqlType> {
        self.types
    }
}

fn significant_tokens(sql: &str) -> Result<Vec<Sig>> {
    let tokens = tokenize(sql)?;
    let mut significant = Vec::new();
    let mut iter = tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Whitespace(_)))
        .peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Colon if matches!(iter.peek(), Some(Token::Word(_))) => {
                iter.next();
                significant.push(Sig::Placeholder);
            }
            token if is_positional(&token) => significant.push(Sig::Placeholder),
            Token::Word(word) => significant.push(Sig::Word(word.value)),
            other => significant.push(Sig::Other(other)),
        }
    }
    Ok(significant)
}

/// Column list of `INSERT INTO t (c1, c2, ..)`, if the statement is one.
fn insert_columns(tokens: &[Sig]) -> Option<Vec<String>> {
    match tokens.first() {
        Some(Sig::Word(word)) if word.eq_ignore_ascii_case("insert") => {}
        _ => return None,
    }

    let open = tokens
        .iter()
        .position(|token| matches!(token, Sig::Other(Token::LParen)))?;
    let mut columns = Vec::new();
    for token in &tokens[open + 1..] {
        match token {
            Sig::Word(word) => columns.push(word.clone()),
            Sig::Other(Token::Comma) => {}
            Sig::Other(Token::RParen) => return Some(columns),
            _ => return None,
        }
    }
    None
}

fn is_comparison(token: &Sig) -> bool {
    match token {
        Sig::Other(token) => matches!(
            token,
            Token::Eq | Token::Neq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq
        ),
        Sig::Word(word) => word.eq_ignore_ascii_case("like"),
        Sig::Placeholder => false,
    }
}

/// Column compared against the placeholder at `index`, on either side.
fn compared_column(tokens: &[Sig], index: usize) -> Option<String> {
    if index >= 2 && is_comparison(&tokens[index - 1]) {
        if let Sig::Word(column) = &tokens[index - 2] {
            return Some(column.clone());
        }
    }
    match (tokens.get(index + 1), tokens.get(index + 2)) {
        (Some(op), Some(Sig::Word(column))) if is_comparison(op) => {
            // qualified names: `? = o.ID`
            let column = match (tokens.get(index + 3), tokens.get(index + 4)) {
                (Some(Sig::Other(Token::Period)), Some(Sig::Word(name))) => name,
                _ => column,
            };
            Some(column.clone())
        }
        _ => None,
    }
}

fn column_type<F>(descriptor: &MappingDescriptor, column: &str, target_id_type: &F) -> Option<SqlType>
where
    F: Fn(&str) -> Option<SqlType>,
{
    if let Some(sql_type) = descriptor.column_sql_type(column) {
        return Some(sql_type);
    }
    if let Some(association) = descriptor.association_for_column(column) {
        return target_id_type(association.target_entity.as_str());
    }
    descriptor
        .property(column)
        .map(|property| persisted_sql_type(&property.type_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AssociationDetails, EntityFieldMetadata, EntityMetadata, FieldKind};
    use crate::mapping::MappingCompiler;

    fn descriptor() -> MappingDescriptor {
        let metadata = EntityMetadata::new("Order")
            .with_table("ORDERS")
            .with_field(EntityFieldMetadata::column("id", "number").identifier())
            .with_field(EntityFieldMetadata::column("name", "string").with_type_hint("varchar"))
            .with_field(EntityFieldMetadata::column("total", "number").with_type_hint("decimal"))
            .with_field(EntityFieldMetadata::column("createdAt", "Date"));
        MappingCompiler::compile(&metadata).unwrap()
    }

    #[test]
    fn test_insert_maps_values_by_position() {
        let metadata = ParameterMetadata::infer(
            "INSERT INTO ORDERS (ID, TOTAL, CREATEDAT) VALUES (?, ?, ?), (?, ?, ?)",
            &descriptor(),
        )
        .unwrap();

        assert_eq!(
            metadata.types(),
            &[
                SqlType::BigInt,
                SqlType::Decimal,
                SqlType::Timestamp,
                SqlType::BigInt,
                SqlType::Decimal,
                SqlType::Timestamp
            ]
        );
    }

    #[test]
    fn test_comparisons_use_column_types() {
        let metadata = ParameterMetadata::infer(
            "UPDATE ORDERS SET TOTAL = :total WHERE ID = :id AND NAME LIKE :pattern",
            &descriptor(),
        )
        .unwrap();
        assert_eq!(
            metadata.types(),
            &[SqlType::Decimal, SqlType::BigInt, SqlType::VarChar]
        );
        assert_eq!(metadata.parameter_type(2), Some(SqlType::BigInt));
        assert_eq!(metadata.parameter_type(0), None);
    }

    #[test]
    fn test_join_column_takes_target_id_type() {
        let metadata = EntityMetadata::new("Order")
            .with_table("ORDERS")
            .with_field(EntityFieldMetadata::column("id", "number").identifier())
            .with_field(EntityFieldMetadata::column("customer", "Customer").with_kind(
                FieldKind::Association(AssociationDetails {
                    target_entity: "Customer".into(),
                    join_column: Some("CUSTOMER_ID".into()),
                    cascade: None,
                    not_null: false,
                    lazy: false,
                }),
            ));
        let descriptor = MappingCompiler::compile(&metadata).unwrap();
        let sql = "SELECT * FROM ORDERS WHERE CUSTOMER_ID = ? AND ID = ?";

        let untyped = ParameterMetadata::infer(sql, &descriptor).unwrap();
        assert_eq!(untyped.types(), &[SqlType::VarChar, SqlType::BigInt]);

        let typed = ParameterMetadata::infer_with_targets(sql, &descriptor, |target| {
            (target == "Customer").then_some(SqlType::Char)
        })
        .unwrap();
        assert_eq!(typed.types(), &[SqlType::Char, SqlType::BigInt]);
    }

    #[test]
    fn test_unknown_context_falls_back_to_varchar() {
        let metadata =
            ParameterMetadata::infer("SELECT * FROM ORDERS LIMIT ?", &descriptor()).unwrap();
        assert_eq!(metadata.types(), &[SqlType::VarChar]);
    }
}
