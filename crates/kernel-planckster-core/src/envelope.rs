//! Result/error envelope protocol.
//!
//! Every repository operation returns an [`Envelope<T>`]: either the data it
//! was asked for, or a fully populated [`ErrorEnvelope`] built by
//! [`ErrorEnvelope::build`]. Expected failures (absent key, missing row,
//! unset dependent data) are always envelopes, never `Err`s.
//!
//! # Taxonomy
//!
//! | Kind | Code | Required context |
//! |------|------|------------------|
//! | [`ErrorKind::MissingAttribute`] | `-1` | attribute |
//! | [`ErrorKind::NotFound`] | `-2` | attribute, value |
//! | [`ErrorKind::MissingDependentData`] | `-3` | attribute, value, missing data |
//!
//! The codes are part of the wire contract.
//!
//! # Wire shape
//!
//! ```json
//! { "status": false, "errorCode": -2,
//!   "errorMessage": "ResearchContext with ID 999 not found in the database",
//!   "errorName": "ResearchContext not found",
//!   "errorType": "ResearchContextNotFound" }
//! ```
//!
//! # Example
//!
//! ```rust
//! use kernel_planckster_core::envelope::{Attribute, Envelope, ErrorKind};
//! use kernel_planckster_core::models::{EntityKind, ResearchContext};
//!
//! let env: Envelope<ResearchContext> =
//!     Envelope::error(EntityKind::ResearchContext, ErrorKind::not_found(Attribute::Id, 999));
//! let err = env.error_envelope().unwrap();
//! assert_eq!(err.code.as_i32(), -2);
//! assert_eq!(err.name, "ResearchContext not found");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::models::EntityKind;

/// Numeric error codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    MissingAttribute = -1,
    NotFound = -2,
    MissingDependentData = -3,
}

impl ErrorCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = ContractViolation;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Self::MissingAttribute),
            -2 => Ok(Self::NotFound),
            -3 => Ok(Self::MissingDependentData),
            other => Err(ContractViolation::UnknownCode(other)),
        }
    }
}

/// Identifying fields an error may name.
///
/// Only these may appear in error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Id,
    Sid,
}

impl Attribute {
    /// Upper-case form used in prose: `ID`, `SID`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Sid => "SID",
        }
    }

    /// Title-case form used in error types: `Id`, `Sid`.
    pub const fn type_fragment(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Sid => "Sid",
        }
    }
}

impl FromStr for Attribute {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "sid" => Ok(Self::Sid),
            _ => Err(ContractViolation::UnknownAttribute(s.to_string())),
        }
    }
}

/// Programmer errors in the use of the envelope factory.
///
/// These indicate a bug in the caller and are never returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("error code {0} is not a known error kind")]
    UnknownCode(i32),
    #[error("attribute '{0}' is not an identifying attribute")]
    UnknownAttribute(String),
    #[error("{field} is required for error code {}", .code.as_i32())]
    MissingContext {
        code: ErrorCode,
        field: &'static str,
    },
}

/// What went wrong, with exactly the context each kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The lookup key was not supplied.
    MissingAttribute { attribute: Attribute },
    /// No row matches `attribute = value`.
    NotFound { attribute: Attribute, value: String },
    /// The row exists but `missing` is unset on it.
    MissingDependentData {
        attribute: Attribute,
        value: String,
        missing: String,
    },
}

impl ErrorKind {
    pub fn missing_attribute(attribute: Attribute) -> Self {
        Self::MissingAttribute { attribute }
    }

    pub fn not_found(attribute: Attribute, value: impl fmt::Display) -> Self {
        Self::NotFound {
            attribute,
            value: value.to_string(),
        }
    }

    /// # Panics
    ///
    /// Panics if `missing` is blank, the same input
    /// [`ErrorKind::from_parts`] rejects.
    pub fn missing_dependent_data(
        attribute: Attribute,
        value: impl fmt::Display,
        missing: impl Into<String>,
    ) -> Self {
        let missing = missing.into();
        assert!(
            !missing.trim().is_empty(),
            "missing dependent data needs the name of what is missing"
        );
        Self::MissingDependentData {
            attribute,
            value: value.to_string(),
            missing,
        }
    }

    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingAttribute { .. } => ErrorCode::MissingAttribute,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::MissingDependentData { .. } => ErrorCode::MissingDependentData,
        }
    }

    /// Builds a kind from untyped parts, checking the context each code
    /// requires.
    pub fn from_parts(
        code: i32,
        attribute: Option<&str>,
        value: Option<&str>,
        missing: Option<&str>,
    ) -> Result<Self, ContractViolation> {
        let code = ErrorCode::try_from(code)?;
        let attribute = attribute
            .ok_or(ContractViolation::MissingContext {
                code,
                field: "attribute",
            })?
            .parse::<Attribute>()?;
        let require_value = || {
            value
                .map(str::to_string)
                .ok_or(ContractViolation::MissingContext {
                    code,
                    field: "attribute value",
                })
        };

        match code {
            ErrorCode::MissingAttribute => Ok(Self::MissingAttribute { attribute }),
            ErrorCode::NotFound => Ok(Self::NotFound {
                attribute,
                value: require_value()?,
            }),
            ErrorCode::MissingDependentData => {
                let value = require_value()?;
                let missing = missing
                    .filter(|m| !m.trim().is_empty())
                    .ok_or(ContractViolation::MissingContext {
                        code,
                        field: "missing data",
                    })?;
                Ok(Self::MissingDependentData {
                    attribute,
                    value,
                    missing: missing.to_string(),
                })
            }
        }
    }
}

/// A populated error, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    /// Human-readable sentence.
    pub message: String,
    /// Stable short name: `"<Entity> not found"`.
    pub name: String,
    /// Stable machine-readable type: `"<Entity>NotFound"`.
    pub error_type: String,
    pub entity: EntityKind,
}

impl ErrorEnvelope {
    /// Composes message, name and type for `kind` on `entity`.
    ///
    /// Pure: identical arguments always produce identical text. Logging is
    /// left to the caller.
    pub fn build(entity: EntityKind, kind: ErrorKind) -> Self {
        let entity_name = entity.name();
        let code = kind.code();

        let (situation, name, error_type) = match &kind {
            ErrorKind::MissingAttribute { attribute } => (
                format!("{} must be provided", attribute.label()),
                format!("{} not provided", attribute.label()),
                format!("{}NotProvided", attribute.type_fragment()),
            ),
            ErrorKind::NotFound { attribute, value } => (
                format!("with {} {} not found in the database", attribute.label(), value),
                "not found".to_string(),
                "NotFound".to_string(),
            ),
            ErrorKind::MissingDependentData {
                attribute,
                value,
                missing,
            } => (
                format!("with {} {} has no {}", attribute.label(), value, missing),
                format!("has no {}", missing),
                format!("HasNo{}", pascal_case(missing)),
            ),
        };

        Self {
            code,
            message: format!("{} {}", entity_name, situation),
            name: format!("{} {}", entity_name, name),
            error_type: format!("{}{}", entity_name, error_type),
            entity,
        }
    }

    /// Like [`build`](Self::build), from untyped parts.
    ///
    /// # Panics
    ///
    /// Panics on a [`ContractViolation`]: an unknown code or attribute, or
    /// context missing for the code.
    pub fn from_parts(
        entity: EntityKind,
        code: i32,
        attribute: Option<&str>,
        value: Option<&str>,
        missing: Option<&str>,
    ) -> Self {
        match ErrorKind::from_parts(code, attribute, value, missing) {
            Ok(kind) => Self::build(entity, kind),
            Err(violation) => panic!(
                "error envelope for {} violates its contract: {}",
                entity.name(),
                violation
            ),
        }
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_i32(), self.message)
    }
}

/// "source data" -> "SourceData", "user" -> "User".
fn pascal_case(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Success-or-error result of a repository operation.
///
/// `T` is the payload type; list operations use `Envelope<Vec<_>>`, where
/// an empty vector is a valid success.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Ok(T),
    Err(ErrorEnvelope),
}

impl<T> Envelope<T> {
    /// Error envelope for `kind` on `entity`. See [`ErrorEnvelope::build`].
    pub fn error(entity: EntityKind, kind: ErrorKind) -> Self {
        Self::Err(ErrorEnvelope::build(entity, kind))
    }

    pub fn status(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok(data) => Some(data),
            Self::Err(_) => None,
        }
    }

    pub fn error_envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::Ok(_) => None,
            Self::Err(err) => Some(err),
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error_envelope().map(|e| e.code.as_i32())
    }

    pub fn into_result(self) -> Result<T, ErrorEnvelope> {
        match self {
            Self::Ok(data) => Ok(data),
            Self::Err(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Ok(data) => Envelope::Ok(f(data)),
            Self::Err(err) => Envelope::Err(err),
        }
    }
}

impl<T> From<ErrorEnvelope> for Envelope<T> {
    fn from(err: ErrorEnvelope) -> Self {
        Self::Err(err)
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(data) => {
                let mut s = serializer.serialize_struct("Envelope", 2)?;
                s.serialize_field("status", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Self::Err(err) => {
                let mut s = serializer.serialize_struct("Envelope", 5)?;
                s.serialize_field("status", &false)?;
                s.serialize_field("errorCode", &err.code.as_i32())?;
                s.serialize_field("errorMessage", &err.message)?;
                s.serialize_field("errorName", &err.name)?;
                s.serialize_field("errorType", &err.error_type)?;
                s.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_attribute_text() {
        let err = ErrorEnvelope::build(
            EntityKind::Message,
            ErrorKind::missing_attribute(Attribute::Id),
        );
        assert_eq!(err.code, ErrorCode::MissingAttribute);
        assert_eq!(err.message, "Message ID must be provided");
        assert_eq!(err.name, "Message ID not provided");
        assert_eq!(err.error_type, "MessageIdNotProvided");
    }

    #[test]
    fn test_not_found_text() {
        let err = ErrorEnvelope::build(
            EntityKind::ResearchContext,
            ErrorKind::not_found(Attribute::Id, 42),
        );
        assert_eq!(err.code.as_i32(), -2);
        assert_eq!(
            err.message,
            "ResearchContext with ID 42 not found in the database"
        );
        assert_eq!(err.name, "ResearchContext not found");
        assert_eq!(err.error_type, "ResearchContextNotFound");
    }

    #[test]
    fn test_missing_dependent_data_text() {
        let err = ErrorEnvelope::build(
            EntityKind::Citation,
            ErrorKind::missing_dependent_data(Attribute::Id, 7, "source data"),
        );
        assert_eq!(err.code.as_i32(), -3);
        assert_eq!(err.message, "Citation with ID 7 has no source data");
        assert_eq!(err.name, "Citation has no source data");
        assert_eq!(err.error_type, "CitationHasNoSourceData");
    }

    #[test]
    #[should_panic(expected = "needs the name of what is missing")]
    fn test_missing_dependent_data_rejects_blank_name() {
        ErrorKind::missing_dependent_data(Attribute::Id, 7, " ");
    }

    #[test]
    fn test_sid_attribute() {
        let err = ErrorEnvelope::build(EntityKind::User, ErrorKind::not_found(Attribute::Sid, "u-1"));
        assert_eq!(err.message, "User with SID u-1 not found in the database");
        let err = ErrorEnvelope::build(EntityKind::User, ErrorKind::missing_attribute(Attribute::Sid));
        assert_eq!(err.error_type, "UserSidNotProvided");
    }

    #[test]
    fn test_attribute_parse_is_case_insensitive() {
        assert_eq!("ID".parse::<Attribute>().unwrap(), Attribute::Id);
        assert_eq!("Sid".parse::<Attribute>().unwrap(), Attribute::Sid);
        assert_eq!(
            "name".parse::<Attribute>(),
            Err(ContractViolation::UnknownAttribute("name".to_string()))
        );
    }

    #[test]
    fn test_from_parts_checks_context() {
        assert_eq!(
            ErrorKind::from_parts(-4, Some("id"), None, None),
            Err(ContractViolation::UnknownCode(-4))
        );
        assert_eq!(
            ErrorKind::from_parts(-1, None, None, None),
            Err(ContractViolation::MissingContext {
                code: ErrorCode::MissingAttribute,
                field: "attribute",
            })
        );
        assert_eq!(
            ErrorKind::from_parts(-2, Some("id"), None, None),
            Err(ContractViolation::MissingContext {
                code: ErrorCode::NotFound,
                field: "attribute value",
            })
        );
        assert_eq!(
            ErrorKind::from_parts(-3, Some("id"), Some("1"), Some("  ")),
            Err(ContractViolation::MissingContext {
                code: ErrorCode::MissingDependentData,
                field: "missing data",
            })
        );
        assert_eq!(
            ErrorKind::from_parts(-3, Some("ID"), Some("1"), Some("user")),
            Ok(ErrorKind::missing_dependent_data(Attribute::Id, 1, "user"))
        );
    }

    #[test]
    fn test_from_parts_matches_typed_build() {
        let typed = ErrorEnvelope::build(EntityKind::SourceData, ErrorKind::not_found(Attribute::Id, 3));
        let untyped = ErrorEnvelope::from_parts(EntityKind::SourceData, -2, Some("id"), Some("3"), None);
        assert_eq!(typed, untyped);
    }

    #[test]
    #[should_panic(expected = "not an identifying attribute")]
    fn test_from_parts_panics_on_unknown_attribute() {
        ErrorEnvelope::from_parts(EntityKind::User, -2, Some("email"), Some("a@b"), None);
    }

    #[test]
    #[should_panic(expected = "is not a known error kind")]
    fn test_from_parts_panics_on_unknown_code() {
        ErrorEnvelope::from_parts(EntityKind::User, 0, Some("id"), Some("1"), None);
    }

    #[test]
    fn test_ok_wire_shape() {
        let env: Envelope<Vec<i64>> = Envelope::Ok(vec![]);
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "status": true, "data": [] })
        );
    }

    #[test]
    fn test_err_wire_shape() {
        let env: Envelope<i64> =
            Envelope::error(EntityKind::Conversation, ErrorKind::not_found(Attribute::Id, 5));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({
                "status": false,
                "errorCode": -2,
                "errorMessage": "Conversation with ID 5 not found in the database",
                "errorName": "Conversation not found",
                "errorType": "ConversationNotFound",
            })
        );
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("source data"), "SourceData");
        assert_eq!(pascal_case("user"), "User");
        assert_eq!(pascal_case("  knowledge-source  "), "KnowledgeSource");
    }
}
