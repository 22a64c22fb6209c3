//! Typed CRM records. Every record is owned by the record gateway; values of
//! these types are transient, re-fetchable copies.

pub mod activity;
pub mod company;
pub mod contact;
pub mod deal;

use thiserror::Error;

/// Gateway-assigned record identifier.
pub type RecordId = i64;

/// A text value that names none of an enum's variants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum from a
/// single table of display labels.
macro_rules! labeled_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == trimmed)
                    .ok_or_else(|| $crate::UnknownVariant::new($kind, trimmed))
            }
        }
    };
}

pub(crate) use labeled_enum;
