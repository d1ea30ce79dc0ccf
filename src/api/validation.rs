// Request body validation

use crate::api::responses::ApiError;
use crate::core::errors::AccountError;
use crate::core::models::{AuthenticationRequest, RegisterRequest};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

/// Field-level checks run after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), AccountError>;
}

/// Collects field violations into a single validation error
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(format!("{}: must not be blank", field));
        }
        self
    }

    fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_well_formed_email(value) {
            self.0.push(format!("{}: must be a well-formed email address", field));
        }
        self
    }

    fn into_result(self) -> Result<(), AccountError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AccountError::ValidationError(self.0.join(", ")))
        }
    }
}

/// `local@domain`, exactly one `@`, no whitespace
pub fn is_well_formed_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains("..")
        }
        None => false,
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AccountError> {
        let mut violations = Violations::default();
        violations
            .not_blank("name", &self.name)
            .email("email", &self.email)
            .not_blank("role", &self.role)
            .not_blank("password", &self.password);
        violations.into_result()
    }
}

impl Validate for AuthenticationRequest {
    fn validate(&self) -> Result<(), AccountError> {
        let mut violations = Violations::default();
        violations
            .not_blank("email", &self.email)
            .not_blank("password", &self.password);
        violations.into_result()
    }
}

/// JSON extractor that rejects malformed or invalid bodies with 400 VALIDATION
///
/// Other body rejections (size limit, content type) keep axum's status.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(json_rejection_response)?;

        value
            .validate()
            .map_err(|e| ApiError::from(e).into_response())?;
        Ok(Self(value))
    }
}

fn json_rejection_response(rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            ApiError::validation(rejection.body_text()).into_response()
        }
        other => other.into_response(),
    }
}
