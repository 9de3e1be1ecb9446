//! RFC 9457 problem responses and the mapping from service errors.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use card_policy::io::resolver::ResolveError;
use card_policy::service::ServiceError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Content type for problem documents.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Request field naming the card owner.
pub const OWNER_FIELD: &str = "userId";
/// Request field naming the card.
pub const CARD_FIELD: &str = "cardNumber";

/// Problem document returned for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(
        rename = "traceId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub trace_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: format!("https://httpstatuses.com/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation error", detail)
    }

    pub fn unsupported_media_type(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type",
            detail,
        )
    }

    /// 500 without internal details; the cause is only logged.
    pub fn unexpected() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected error",
            "An error occurred.",
        )
    }

    /// Attach the request id to server errors so a caller can quote it.
    pub fn for_request(self, request_id: Option<String>) -> Self {
        if self.status_code().is_server_error() {
            self.with_trace_id(request_id)
        } else {
            self
        }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

impl From<ServiceError> for Problem {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::MissingIdentifiers => Problem::validation(format!(
                "Both {} and {} are required.",
                OWNER_FIELD, CARD_FIELD
            )),
            ServiceError::Resolve(ResolveError::OwnerNotFound { owner_id }) => Problem::new(
                StatusCode::NOT_FOUND,
                "User not found",
                format!("User '{}' does not exist.", owner_id),
            ),
            ServiceError::Resolve(ResolveError::InstrumentNotFound {
                owner_id,
                instrument_id,
            }) => Problem::new(
                StatusCode::NOT_FOUND,
                "Card not found",
                format!("User '{}' does not own card '{}'.", owner_id, instrument_id),
            ),
            ServiceError::Resolve(ResolveError::Unavailable(_)) => {
                error!(error = %err, "card lookup failed");
                Problem::unexpected()
            }
            ServiceError::Policy(_) => {
                error!(error = %err, "policy evaluation failed");
                Problem::unexpected()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use card_policy::error::PolicyError;

    use super::*;

    #[test]
    fn missing_identifiers_map_to_literal_validation_message() {
        let problem = Problem::from(ServiceError::MissingIdentifiers);
        assert_eq!(problem.status, 400);
        assert_eq!(problem.title, "Validation error");
        assert_eq!(problem.detail, "Both userId and cardNumber are required.");
        assert_eq!(problem.type_url, "https://httpstatuses.com/400");
    }

    #[test]
    fn not_found_details_name_the_identifiers() {
        let owner = Problem::from(ServiceError::Resolve(ResolveError::OwnerNotFound {
            owner_id: "NoSuchUser".to_string(),
        }));
        assert_eq!(owner.status, 404);
        assert_eq!(owner.title, "User not found");
        assert_eq!(owner.detail, "User 'NoSuchUser' does not exist.");

        let card = Problem::from(ServiceError::Resolve(ResolveError::InstrumentNotFound {
            owner_id: "User1".to_string(),
            instrument_id: "Nope".to_string(),
        }));
        assert_eq!(card.status, 404);
        assert_eq!(card.title, "Card not found");
        assert_eq!(card.detail, "User 'User1' does not own card 'Nope'.");
    }

    #[test]
    fn internal_failures_hide_their_cause() {
        let problem = Problem::from(ServiceError::Policy(PolicyError::InvalidConfiguration(
            "no rule for lifecycle state Active".to_string(),
        )));
        assert_eq!(problem.status, 500);
        assert_eq!(problem.title, "Unexpected error");
        assert!(!problem.detail.contains("Active"));
    }

    #[test]
    fn request_id_is_attached_to_server_errors_only() {
        let id = Some("req-1".to_string());
        assert_eq!(
            Problem::unexpected().for_request(id.clone()).trace_id.as_deref(),
            Some("req-1")
        );
        assert_eq!(Problem::validation("bad").for_request(id).trace_id, None);
    }

    #[test]
    fn into_response_sets_problem_content_type() {
        let response = Problem::validation("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("header"),
            APPLICATION_PROBLEM_JSON
        );
    }
}
