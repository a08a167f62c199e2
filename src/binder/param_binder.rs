use log::debug;

use super::named::NamedStatement;
use super::payload::NamedParam;
use super::setters::ParamSetter;
use super::statement::{BoundParam, PreparedStatement};
use crate::core::{MarshalError, Result, SqlType, Value};

const STATEMENT_CONTEXT_CHARS: usize = 60;

/// Binds loosely typed values onto prepared statement parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterBinder;

impl ParameterBinder {
    pub fn new() -> Self {
        Self
    }

    /// Bind one value per statement parameter, in order.
    pub fn bind_indexed<S>(&self, values: &[Value], statement: &mut S) -> Result<()>
    where
        S: PreparedStatement + ?Sized,
    {
        let expected = statement.parameter_count();
        if values.len() != expected {
            return Err(MarshalError::binding(format!(
                "Expected {} parameters but got {}{}",
                expected,
                values.len(),
                statement_context(&*statement)
            )));
        }

        for (offset, value) in values.iter().enumerate() {
            let index = offset + 1;
            let sql_type = statement.parameter_type(index)?;

            let param = if sql_type == SqlType::Null || value.is_null() {
                BoundParam::Null(sql_type)
            } else {
                let type_name = statement.parameter_type_name(index)?;
                self.resolve_param(&type_name, sql_type, value)
                    .map_err(|err| wrap(format!("parameter {}", index), &type_name, &*statement, err))?
            };

            statement.bind(index, param)?;
        }
        Ok(())
    }

    /// Bind `{name, type, value}` records onto a named statement.
    ///
    /// Null values always take the null path, typed from the declared name.
    pub fn bind_named<S>(&self, params: &[NamedParam], statement: &mut NamedStatement<S>) -> Result<()>
    where
        S: PreparedStatement,
    {
        for param in params {
            let bound = if param.value.is_null() {
                let sql_type = SqlType::from_name(&param.type_name).ok_or_else(|| {
                    MarshalError::binding(format!(
                        "Unknown database type '{}' for parameter ':{}'",
                        param.type_name, param.name
                    ))
                })?;
                BoundParam::Null(sql_type)
            } else {
                ParamSetter::resolve(&param.type_name)
                    .and_then(|(sql_type, setter)| setter.to_param(sql_type, &param.value))
                    .map_err(|err| {
                        wrap(
                            format!("parameter ':{}'", param.name),
                            &param.type_name,
                            statement.statement(),
                            err,
                        )
                    })?
            };

            statement.bind_name(&param.name, bound)?;
        }
        Ok(())
    }

    /// Bind every row and queue it as a batch entry. Returns the number of rows queued.
    ///
    /// Executing the batch is left to the caller.
    pub fn bind_many_indexed<S>(&self, rows: &[Vec<Value>], statement: &mut S) -> Result<usize>
    where
        S: PreparedStatement + ?Sized,
    {
        let _span = tracing::debug_span!("bind_batch", rows = rows.len()).entered();

        for (row, values) in rows.iter().enumerate() {
            self.bind_indexed(values, statement).map_err(|err| match err {
                MarshalError::Binding { .. } => MarshalError::binding_caused_by(
                    format!("Row {}: {}", row + 1, detail(&err)),
                    err,
                ),
                other => other,
            })?;
            statement.add_batch()?;
        }

        debug!("Queued {} batch row(s)", rows.len());
        Ok(rows.len())
    }

    /// Named counterpart of [`bind_many_indexed`](Self::bind_many_indexed).
    pub fn bind_many_named<S>(
        &self,
        rows: &[Vec<NamedParam>],
        statement: &mut NamedStatement<S>,
    ) -> Result<usize>
    where
        S: PreparedStatement,
    {
        let _span = tracing::debug_span!("bind_named_batch", rows = rows.len()).entered();

        for (row, params) in rows.iter().enumerate() {
            self.bind_named(params, statement).map_err(|err| match err {
                MarshalError::Binding { .. } => MarshalError::binding_caused_by(
                    format!("Row {}: {}", row + 1, detail(&err)),
                    err,
                ),
                other => other,
            })?;
            statement.add_batch()?;
        }
        Ok(rows.len())
    }

    /// Unwrap the object form `{"value": ..}` and run the setter for `type_name`.
    fn resolve_param(&self, type_name: &str, declared: SqlType, value: &Value) -> Result<BoundParam> {
        let value = match value {
            Value::Map(object) => object.get("value").ok_or_else(|| {
                MarshalError::binding(format!(
                    "Object parameter {} has no 'value' field",
                    value
                ))
            })?,
            other => other,
        };

        if value.is_null() {
            return Ok(BoundParam::Null(declared));
        }

        let (sql_type, setter) = ParamSetter::resolve(type_name)?;
        setter.to_param(sql_type, value)
    }
}

fn statement_context<S: PreparedStatement + ?Sized>(statement: &S) -> String {
    match statement.sql() {
        Some(sql) => {
            let mut excerpt: String = sql.chars().take(STATEMENT_CONTEXT_CHARS).collect();
            if sql.chars().count() > STATEMENT_CONTEXT_CHARS {
                excerpt.push_str("...");
            }
            format!(" in statement `{}`", excerpt)
        }
        None => String::new(),
    }
}

fn detail(err: &MarshalError) -> String {
    match err {
        MarshalError::Binding { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Prefix a setter failure with the parameter it happened on, keeping the cause.
fn wrap<S: PreparedStatement + ?Sized>(
    target: String,
    type_name: &str,
    statement: &S,
    err: MarshalError,
) -> MarshalError {
    match err {
        MarshalError::Binding { .. } => MarshalError::binding_caused_by(
            format!(
                "Failed to bind {} as {}{}: {}",
                target,
                type_name,
                statement_context(statement),
                detail(&err)
            ),
            err,
        ),
        other => other,
    }
}
