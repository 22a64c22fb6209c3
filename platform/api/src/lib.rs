use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// Field name to message for every rejected input field.
    #[error("validation failed")]
    Validation(Vec<(String, String)>),
    #[error("invalid stage `{0}`")]
    InvalidStage(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::InvalidStage(_) => "INVALID_STAGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Rejected(_) => "REJECTED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        if let ApiError::Internal(source) = self {
            tracing::error!(error = %source, "internal error");
        }
        let mut err = Error::new(self.to_string()).extend_with(|_err, e| {
            e.set("code", self.code());
        });
        if let ApiError::Validation(fields) = self {
            let fields: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = fields
                .iter()
                .map(|(field, message)| {
                    (async_graphql::Name::new(field), Value::from(message.as_str()))
                })
                .collect();
            err = err.extend_with(|_err, e| {
                e.set("fields", Value::Object(fields));
            });
        }
        err
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}
