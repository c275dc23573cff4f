//! `Json` extractor that also runs `validator` rules.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Body extractor for request DTOs. Undecodable bodies and rule violations
/// are both answered with a 400 `Validation` error.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;

        payload
            .validate()
            .map_err(|errors| AppError::validation(describe(&errors)))?;
        Ok(Self(payload))
    }
}

/// One message per failing field, in field-name order so the output is
/// stable.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let messages: Vec<String> = fields
        .into_iter()
        .filter_map(|(field, failures)| {
            failures.first().map(|failure| match &failure.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    if messages.is_empty() {
        "Validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "items must not be empty"))]
        items: Vec<i32>,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn test_messages_are_joined_in_field_order() {
        let errors = Sample {
            items: vec![],
            quantity: 0,
        }
        .validate()
        .unwrap_err();

        assert_eq!(describe(&errors), "items must not be empty; quantity is invalid");
    }

    #[test]
    fn test_valid_payload_passes() {
        let sample = Sample {
            items: vec![1],
            quantity: 2,
        };
        assert!(sample.validate().is_ok());
    }
}
