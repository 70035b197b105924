use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use formkern_application::{AttachmentPayload, SubmissionTransport, TransportOutcome};
use formkern_core::{AppError, AppResult, FieldId};
use serde_json::{Value, json};
use url::Url;

/// HTTP-based submission transport.
///
/// Posts the value tree plus base64-inlined attachments as one JSON body.
/// Responses map onto the transport outcome: 2xx is acceptance, a 400/422
/// body carrying a `field_errors` object is a field-level rejection, every
/// other status is a rejection without field detail. Request-level faults
/// (connection refused, timeouts) surface as transport errors for the
/// orchestrator to reclassify.
pub struct HttpSubmissionTransport {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpSubmissionTransport {
    /// Creates a transport posting to the given endpoint.
    pub fn new(http_client: reqwest::Client, endpoint: &str) -> AppResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|error| {
            AppError::Validation(format!("invalid submission endpoint '{endpoint}': {error}"))
        })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    fn request_body(values: &Value, attachments: &[AttachmentPayload]) -> Value {
        let attachments: Vec<Value> = attachments
            .iter()
            .map(|attachment| {
                json!({
                    "field": attachment.field.as_str(),
                    "file_name": attachment.file_name,
                    "content_type": attachment.content_type,
                    "data": BASE64.encode(&attachment.bytes),
                })
            })
            .collect();

        json!({
            "values": values,
            "attachments": attachments,
        })
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn submit(
        &self,
        values: &Value,
        attachments: &[AttachmentPayload],
    ) -> AppResult<TransportOutcome> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&Self::request_body(values, attachments))
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("submission request failed: {error}")))?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        classify_response(status, body)
    }
}

fn classify_response(status: u16, body: Value) -> AppResult<TransportOutcome> {
    if (200..300).contains(&status) {
        return Ok(TransportOutcome::Accepted(
            body.get("data").cloned().unwrap_or(body),
        ));
    }

    if matches!(status, 400 | 422) {
        if let Some(field_errors) = body.get("field_errors").and_then(Value::as_object) {
            let mut errors = BTreeMap::new();
            for (field, message) in field_errors {
                let field = FieldId::new(field.as_str())?;
                let message = match message.as_str() {
                    Some(text) if !text.trim().is_empty() => text.to_owned(),
                    _ => format!("rejected with status {status}"),
                };
                errors.insert(field, message);
            }

            if !errors.is_empty() {
                return Ok(TransportOutcome::RejectedFields(errors));
            }
        }
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("submission rejected with status {status}"));

    Ok(TransportOutcome::RejectedMessage(message))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use formkern_application::TransportOutcome;

    use super::{HttpSubmissionTransport, classify_response};

    #[test]
    fn endpoint_must_be_a_valid_url() {
        let transport = HttpSubmissionTransport::new(reqwest::Client::new(), "not a url");
        assert!(transport.is_err());
    }

    #[test]
    fn success_status_is_accepted_with_data() {
        let outcome = classify_response(201, json!({"data": {"id": 7}}));
        assert_eq!(
            outcome.ok(),
            Some(TransportOutcome::Accepted(json!({"id": 7})))
        );
    }

    #[test]
    fn unprocessable_body_with_field_errors_is_a_field_rejection() {
        let outcome = classify_response(422, json!({"field_errors": {"title": "too long"}}));
        let Ok(TransportOutcome::RejectedFields(errors)) = outcome else {
            unreachable!("expected field rejection");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().map(|(field, message)| (field.as_str(), message.as_str())),
            Some(("title", "too long"))
        );
    }

    #[test]
    fn blank_field_error_values_get_a_fallback_message() {
        let outcome = classify_response(422, json!({"field_errors": {"title": "", "amount": 7}}));
        let Ok(TransportOutcome::RejectedFields(errors)) = outcome else {
            unreachable!("expected field rejection");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.values().all(|message| !message.trim().is_empty()));
    }

    #[test]
    fn server_error_is_a_message_rejection() {
        let outcome = classify_response(500, json!({"message": "temporarily unavailable"}));
        assert_eq!(
            outcome.ok(),
            Some(TransportOutcome::RejectedMessage(
                "temporarily unavailable".to_owned()
            ))
        );
    }

    #[test]
    fn payload_too_large_without_body_gets_a_status_message() {
        let outcome = classify_response(413, serde_json::Value::Null);
        assert_eq!(
            outcome.ok(),
            Some(TransportOutcome::RejectedMessage(
                "submission rejected with status 413".to_owned()
            ))
        );
    }
}
