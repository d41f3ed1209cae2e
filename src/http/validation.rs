//! Declarative request validation.
//!
//! # Data Flow
//! ```text
//! Request body / query / path
//!     → deserialize (400 invalid_request | invalid_query | invalid_params)
//!     → validate(): Validate::RULES evaluated per field, in order
//!     → 400 validation_error with the FieldError list as details
//!     → handler receives the typed payload
//! ```
//!
//! # Design Decisions
//! - Rules are a static table per type; no reflection or derive macro
//! - At most one error per field: the first failing rule wins
//! - Lengths count characters, not bytes

use std::borrow::Cow;
use std::sync::LazyLock;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::response::Response;
use axum::Json;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::ValidateEmail;

use crate::http::response;
use crate::models::FieldError;

/// A validation rule applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MinLen(usize),
    MaxLen(usize),
    Len(usize),
    Alphanumeric,
    Numeric,
    Uuid,
    /// The field must equal the named sibling field.
    EqualsField(&'static str),
}

impl Rule {
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::MinLen(_) => "min",
            Rule::MaxLen(_) => "max",
            Rule::Len(_) => "len",
            Rule::Alphanumeric => "alphanum",
            Rule::Numeric => "numeric",
            Rule::Uuid => "uuid",
            Rule::EqualsField(_) => "eqfield",
        }
    }

    pub fn param(&self) -> String {
        match self {
            Rule::MinLen(n) | Rule::MaxLen(n) | Rule::Len(n) => n.to_string(),
            Rule::EqualsField(other) => (*other).to_owned(),
            _ => String::new(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Rule::Required => "This field is required".to_owned(),
            Rule::Email => "Please enter a valid email address".to_owned(),
            Rule::MinLen(_) => "Does not meet minimum length requirement".to_owned(),
            Rule::MaxLen(_) => "Exceeds maximum length limit".to_owned(),
            Rule::Len(n) => format!("Must be exactly {n} characters long"),
            Rule::Alphanumeric => "Must contain only alphanumeric characters".to_owned(),
            Rule::Numeric => "Must contain only numeric characters".to_owned(),
            Rule::Uuid => "Must be a valid UUID".to_owned(),
            Rule::EqualsField(_) => "Fields do not match".to_owned(),
        }
    }

    fn passes<T: Validate>(&self, value: Option<&str>, payload: &T) -> bool {
        let Some(value) = value else {
            // Absent optional fields only fail `Required`.
            return !matches!(self, Rule::Required);
        };

        match self {
            Rule::Required => !value.is_empty(),
            Rule::Email => is_email(value),
            Rule::MinLen(n) => value.chars().count() >= *n,
            Rule::MaxLen(n) => value.chars().count() <= *n,
            Rule::Len(n) => value.chars().count() == *n,
            Rule::Alphanumeric => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()),
            Rule::Numeric => is_numeric(value),
            Rule::Uuid => value.len() == 36 && uuid::Uuid::parse_str(value).is_ok(),
            Rule::EqualsField(other) => payload.field(other).as_deref() == Some(value),
        }
    }
}

fn is_email(value: &str) -> bool {
    value.validate_email()
}

/// Optional sign, digits, optional fraction.
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("numeric pattern compiles"));

fn is_numeric(value: &str) -> bool {
    NUMERIC.is_match(value)
}

/// Types whose fields are checked against a static rule table.
pub trait Validate {
    /// `(field name, rules)` pairs, evaluated in order.
    const RULES: &'static [(&'static str, &'static [Rule])];

    /// String form of the named field, `None` when absent.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Evaluate every rule of `T` against `payload`.
pub fn validate<T: Validate>(payload: &T) -> Vec<FieldError> {
    T::RULES
        .iter()
        .filter_map(|(name, rules)| {
            let value = payload.field(name);
            rules
                .iter()
                .find(|rule| !rule.passes(value.as_deref(), payload))
                .map(|rule| FieldError {
                    field: (*name).to_owned(),
                    tag: rule.tag().to_owned(),
                    value: rule.param(),
                    message: rule.message(),
                })
        })
        .collect()
}

fn check<T: Validate>(payload: T) -> Result<T, Response> {
    let errors = validate(&payload);
    if errors.is_empty() {
        return Ok(payload);
    }
    tracing::debug!(errors = errors.len(), "Request failed validation");
    let details = serde_json::to_value(&errors).ok();
    Err(response::bad_request("validation_error", "Validation failed", details))
}

/// JSON body that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

/// Path parameters that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected request body");
            response::bad_request("invalid_request", "Invalid request body format", None)
        })?;
        check(payload).map(ValidatedJson)
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected query string");
                response::bad_request("invalid_query", "Invalid query parameters", None)
            })?;
        check(query).map(ValidatedQuery)
    }
}

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected path parameters");
                response::bad_request("invalid_params", "Invalid URL parameters", None)
            })?;
        check(params).map(ValidatedPath)
    }
}
