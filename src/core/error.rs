use thiserror::Error;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("Parse error in '{location}' at line {line}: {message}")]
    Parse {
        location: String,
        line: usize,
        message: String,
    },

    #[error("Mapping error for entity '{entity}': {message}")]
    Mapping { entity: String, message: String },

    #[error("Binding error: {message}")]
    Binding {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Normalization error for '{entity}.{field}': {message}")]
    Normalization {
        entity: String,
        field: String,
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Entity '{0}' not found")]
    EntityNotFound(String),

    #[error("Statement error: {0}")]
    Statement(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarshalError>;

impl MarshalError {
    pub fn parse(location: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn mapping(entity: &str, message: impl Into<String>) -> Self {
        Self::Mapping {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding {
            message: message.into(),
            source: None,
        }
    }

    /// Binding error that keeps the underlying cause reachable via `source()`.
    pub fn binding_caused_by(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Binding {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn normalization(entity: &str, field: &str, message: impl Into<String>) -> Self {
        Self::Normalization {
            entity: entity.to_string(),
            field: field.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub fn normalization_caused_by(
        entity: &str,
        field: &str,
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Normalization {
            entity: entity.to_string(),
            field: field.to_string(),
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding { .. })
    }
}

impl<T> From<std::sync::PoisonError<T>> for MarshalError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_binding_error_keeps_cause() {
        let cause = "abc".parse::<i64>().unwrap_err();
        let err = MarshalError::binding_caused_by("Cannot bind 'abc' as INTEGER", cause);

        assert!(err.to_string().contains("'abc'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_parse_error_message_names_location_and_line() {
        let err = MarshalError::parse("orders/Order.ts", 7, "missing identifier");
        assert_eq!(
            err.to_string(),
            "Parse error in 'orders/Order.ts' at line 7: missing identifier"
        );
    }
}
