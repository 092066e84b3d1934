use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use onboard_core::{EmployeeRecord, SubmissionResponse};
use onboard_util::ClientConfig;

/// HTTP transport that posts validated employee records to the registration endpoint.
#[derive(Clone)]
pub struct RegistrationClient {
    http: Client,
    endpoint: Url,
}

impl RegistrationClient {
    /// Creates a client that posts to `endpoint` using the provided HTTP client.
    pub fn new(endpoint: Url, http: Client) -> Self {
        Self { http, endpoint }
    }

    /// Builds a client with the configured server URL and request timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::new(config.server_url.clone(), http))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends the candidate record and decodes the endpoint's verdict.
    ///
    /// Any response carrying a decodable body is returned as data, including
    /// `500` store failures; those are never reported as successful. Only an
    /// unreachable server, a timeout or an unreadable body become errors.
    pub async fn submit(&self, record: &EmployeeRecord) -> Result<SubmissionResponse, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<SubmissionResponse>(&bytes) {
            Ok(mut body) => {
                if !status.is_success() {
                    body.success = false;
                }
                Ok(body)
            }
            Err(err) if status.is_success() => Err(TransportError::Decode(err)),
            Err(_) => Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}

/// Errors produced by the registration transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(serde_json::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use onboard_core::{validate, EmployeeDraft};
    use serde_json::json;

    fn client(server: &MockServer) -> RegistrationClient {
        let endpoint = Url::parse(&server.url("/")).expect("url");
        RegistrationClient::new(endpoint, Client::builder().build().expect("client"))
    }

    fn record() -> EmployeeRecord {
        let draft = EmployeeDraft {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            employee_id: "E-1".into(),
            email: "ada@example.com".into(),
            phone_number: "1234567890".into(),
            department: "HR".into(),
            date_of_joining: "2024-01-02".into(),
            role: "Manager".into(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        validate(&draft, today).expect("fixture must be valid")
    }

    #[tokio::test]
    async fn posts_record_with_wire_names() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body(json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "employeeID": "E-1",
                    "email": "ada@example.com",
                    "phoneNumber": "1234567890",
                    "department": "HR",
                    "dateOfJoining": "2024-01-02",
                    "role": "Manager"
                }));
                then.status(200)
                    .json_body(json!({ "success": true, "message": "Employee added successfully" }));
            })
            .await;

        let response = client(&server).submit(&record()).await.expect("submit");
        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(response.message, "Employee added successfully");
    }

    #[tokio::test]
    async fn duplicate_rejection_is_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .json_body(json!({ "success": false, "message": "Employee already exists." }));
            })
            .await;

        let response = client(&server).submit(&record()).await.expect("submit");
        assert!(!response.success);
        assert_eq!(response.message, "Employee already exists.");
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn store_failure_is_data_and_never_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(500).json_body(json!({
                    "success": true,
                    "message": "Database error",
                    "error": "pool closed"
                }));
            })
            .await;

        let response = client(&server).submit(&record()).await.expect("submit");
        assert!(!response.success);
        assert_eq!(response.message, "Database error");
        assert_eq!(response.error.as_deref(), Some("pool closed"));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).body("<html>ok</html>");
            })
            .await;

        let err = client(&server).submit(&record()).await.expect_err("should error");
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn error_status_without_json_returns_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = client(&server).submit(&record()).await.expect_err("should error");
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
