use std::collections::BTreeMap;
use std::fmt;

use entity::RecordId;
use platform_gateway::GatewayError;
use thiserror::Error;

pub type CrmResult<T> = Result<T, CrmError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrmError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid stage `{0}`")]
    InvalidStage(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("{entity} rejected by gateway: {message}")]
    Rejected {
        entity: &'static str,
        message: String,
    },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{entity}.{field}: {reason}")]
    Mapping {
        entity: &'static str,
        field: String,
        reason: String,
    },
}

impl CrmError {
    pub(crate) fn mapping(entity: &'static str, field: &str, reason: impl Into<String>) -> Self {
        CrmError::Mapping {
            entity,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Field name to message, one entry per failing field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first message for `field`; later ones are ignored.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for CrmError {
    fn from(errors: ValidationErrors) -> Self {
        CrmError::Validation(errors)
    }
}
