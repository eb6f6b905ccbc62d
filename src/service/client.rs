//! Requester API client over the AWS SDK.
//!
//! Credentials come from the standard AWS chain (environment, shared
//! profiles, SSO, container or instance metadata).

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::service::{
    ListReviewableResponse, ListSubmissionsResponse, ListWorkUnitsResponse, RawSubmission,
    RawWorkUnit, TaskService, WorkUnitRef,
};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_mturk::config::http::HttpResponse;
use aws_sdk_mturk::config::Region;
use aws_sdk_mturk::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_mturk::types::{Assignment, Hit};
use aws_sdk_mturk::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Which requester API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Worker-free sandbox; nothing costs money
    #[default]
    Sandbox,
    /// Live marketplace
    Production,
}

impl Environment {
    /// Default endpoint URL for the environment.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://mturk-requester-sandbox.us-east-1.amazonaws.com",
            Environment::Production => "https://mturk-requester.us-east-1.amazonaws.com",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "Sandbox"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

/// Requester API client.
#[derive(Debug, Clone)]
pub struct MturkClient {
    client: Client,
}

impl MturkClient {
    /// Wrap a pre-built SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS config chain.
    ///
    /// Region, endpoint and timeout come from `config`; automatic retries are
    /// disabled so every failure surfaces on the call that caused it.
    pub async fn from_config(config: &ServiceConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.effective_endpoint())
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(config.timeout_seconds))
                    .build(),
            )
            .load()
            .await;

        Self::new(Client::new(&sdk_config))
    }
}

/// Map an SDK failure of `operation` into the service error taxonomy.
fn service_error<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            let status = context.raw().status().as_u16();
            let err = context.into_err();
            ServiceError::Api {
                operation,
                status,
                code: err.code().map(str::to_string),
                message: err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            }
        }
        other => ServiceError::Transport {
            operation,
            message: DisplayErrorContext(&other).to_string(),
        },
    }
}

fn max_results(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}

fn count(value: Option<i32>) -> Option<u64> {
    value.and_then(|n| u64::try_from(n).ok())
}

impl From<&Hit> for RawWorkUnit {
    fn from(hit: &Hit) -> Self {
        Self {
            hit_id: hit.hit_id().map(str::to_string),
            hit_type_id: hit.hit_type_id().map(str::to_string),
            title: hit.title().map(str::to_string),
            hit_status: hit.hit_status().map(|s| s.as_str().to_string()),
            review_status: hit.hit_review_status().map(|s| s.as_str().to_string()),
            expiration: hit.expiration().copied(),
            assignments_pending: count(hit.number_of_assignments_pending()),
            assignments_available: count(hit.number_of_assignments_available()),
            assignments_completed: count(hit.number_of_assignments_completed()),
        }
    }
}

impl From<&Assignment> for RawSubmission {
    fn from(assignment: &Assignment) -> Self {
        Self {
            assignment_id: assignment.assignment_id().map(str::to_string),
            hit_id: assignment.hit_id().map(str::to_string),
            worker_id: assignment.worker_id().map(str::to_string),
            assignment_status: assignment
                .assignment_status()
                .map(|s| s.as_str().to_string()),
            accept_time: assignment.accept_time().copied(),
            submit_time: assignment.submit_time().copied(),
            answer: assignment.answer().map(str::to_string),
        }
    }
}

#[async_trait]
impl TaskService for MturkClient {
    async fn list_work_units(
        &self,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ListWorkUnitsResponse, ServiceError> {
        debug!("ListHITs (cursor: {})", cursor.is_some());
        let resp = self
            .client
            .list_hits()
            .max_results(max_results(page_size))
            .set_next_token(cursor)
            .send()
            .await
            .map_err(|e| service_error("ListHITs", e))?;

        Ok(ListWorkUnitsResponse {
            hits: resp.hits().iter().map(RawWorkUnit::from).collect(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn list_reviewable_work_units(
        &self,
        type_id: &str,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ListReviewableResponse, ServiceError> {
        debug!("ListReviewableHITs {} (cursor: {})", type_id, cursor.is_some());
        let resp = self
            .client
            .list_reviewable_hits()
            .hit_type_id(type_id)
            .max_results(max_results(page_size))
            .set_next_token(cursor)
            .send()
            .await
            .map_err(|e| service_error("ListReviewableHITs", e))?;

        Ok(ListReviewableResponse {
            hits: resp
                .hits()
                .iter()
                .map(|hit| WorkUnitRef {
                    hit_id: hit.hit_id().map(str::to_string),
                })
                .collect(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn list_submissions(
        &self,
        work_unit_id: &str,
        page_size: u32,
    ) -> Result<ListSubmissionsResponse, ServiceError> {
        debug!("ListAssignmentsForHIT {}", work_unit_id);
        let resp = self
            .client
            .list_assignments_for_hit()
            .hit_id(work_unit_id)
            .max_results(max_results(page_size))
            .send()
            .await
            .map_err(|e| service_error("ListAssignmentsForHIT", e))?;

        Ok(ListSubmissionsResponse {
            assignments: resp.assignments().iter().map(RawSubmission::from).collect(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn account_balance(&self) -> Result<String, ServiceError> {
        let resp = self
            .client
            .get_account_balance()
            .send()
            .await
            .map_err(|e| service_error("GetAccountBalance", e))?;

        resp.available_balance()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Decode {
                operation: "GetAccountBalance",
                message: "response has no AvailableBalance".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::CursorPage;
    use aws_sdk_mturk::config::Credentials;
    use aws_sdk_mturk::Config;
    use mockito::Matcher;
    use serde_json::json;

    const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

    fn client_at(endpoint: &str) -> MturkClient {
        let config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "static"))
            .retry_config(RetryConfig::disabled())
            .build();
        MturkClient::new(Client::from_conf(config))
    }

    fn client_for(server: &mockito::ServerGuard) -> MturkClient {
        client_at(&server.url())
    }

    #[test]
    fn test_environment_endpoints() {
        assert!(Environment::Sandbox.endpoint().contains("sandbox"));
        assert!(!Environment::Production.endpoint().contains("sandbox"));
        assert_eq!(Environment::default(), Environment::Sandbox);
    }

    #[test]
    fn test_negative_counts_are_dropped() {
        assert_eq!(count(Some(3)), Some(3));
        assert_eq!(count(Some(-1)), None);
        assert_eq!(count(None), None);
    }

    #[test]
    fn test_hit_conversion() {
        let hit = Hit::builder()
            .hit_id("H1")
            .hit_type_id("T1")
            .title("Label images")
            .hit_status(aws_sdk_mturk::types::HitStatus::Reviewable)
            .number_of_assignments_completed(2)
            .build();

        let raw = RawWorkUnit::from(&hit);
        assert_eq!(raw.hit_id.as_deref(), Some("H1"));
        assert_eq!(raw.hit_status.as_deref(), Some("Reviewable"));
        assert_eq!(raw.assignments_completed, Some(2));
        assert!(raw.review_status.is_none());
    }

    #[tokio::test]
    async fn test_list_work_units_sends_target_and_cursor() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "MTurkRequesterServiceV20170117.ListHITs")
            .match_header("authorization", Matcher::Regex("^AWS4-HMAC-SHA256 ".to_string()))
            .match_body(Matcher::Json(json!({"MaxResults": 100, "NextToken": "abc"})))
            .with_status(200)
            .with_header("content-type", CONTENT_TYPE)
            .with_body(
                r#"{"NextToken": "def", "HITs": [{"HITId": "H1", "HITStatus": "Assignable"}]}"#,
            )
            .create_async()
            .await;

        let resp = client_for(&server)
            .list_work_units(100, Some("abc".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.hits.len(), 1);
        assert_eq!(resp.hits[0].hit_id.as_deref(), Some("H1"));
        assert_eq!(resp.hits[0].hit_status.as_deref(), Some("Assignable"));
        assert_eq!(resp.next_cursor(), Some("def"));
    }

    #[tokio::test]
    async fn test_list_submissions_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header(
                "x-amz-target",
                "MTurkRequesterServiceV20170117.ListAssignmentsForHIT",
            )
            .match_body(Matcher::Json(json!({"HITId": "H1", "MaxResults": 100})))
            .with_status(200)
            .with_header("content-type", CONTENT_TYPE)
            .with_body(
                r#"{"Assignments": [{
                    "AssignmentId": "A1",
                    "HITId": "H1",
                    "WorkerId": "W1",
                    "AssignmentStatus": "Submitted",
                    "AcceptTime": 1700000000,
                    "SubmitTime": 1700000060.5,
                    "Answer": "<QuestionFormAnswers/>"
                }]}"#,
            )
            .create_async()
            .await;

        let resp = client_for(&server).list_submissions("H1", 100).await.unwrap();

        mock.assert_async().await;
        assert_eq!(resp.assignments.len(), 1);
        let raw = &resp.assignments[0];
        assert_eq!(raw.assignment_status.as_deref(), Some("Submitted"));
        assert_eq!(raw.accept_time.map(|t| t.secs()), Some(1_700_000_000));
        assert_eq!(raw.submit_time.map(|t| t.secs()), Some(1_700_000_060));
        assert!(raw.answer.is_some());
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_header("content-type", CONTENT_TYPE)
            .with_body(r#"{"__type": "RequestError", "Message": "bad token"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .list_reviewable_work_units("T1", 100, None)
            .await
            .unwrap_err();

        match err {
            ServiceError::Api {
                operation,
                status,
                code,
                message,
            } => {
                assert_eq!(operation, "ListReviewableHITs");
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("RequestError"));
                assert!(message.contains("bad token"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_account_balance() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "MTurkRequesterServiceV20170117.GetAccountBalance")
            .with_status(200)
            .with_header("content-type", CONTENT_TYPE)
            .with_body(r#"{"AvailableBalance": "10000.00"}"#)
            .create_async()
            .await;

        let balance = client_for(&server).account_balance().await.unwrap();
        assert_eq!(balance, "10000.00");
    }

    #[tokio::test]
    async fn test_missing_balance_maps_to_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", CONTENT_TYPE)
            .with_body("{}")
            .create_async()
            .await;

        let err = client_for(&server).account_balance().await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Decode {
                operation: "GetAccountBalance",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_transport_error() {
        // Nothing listens on port 1.
        let err = client_at("http://127.0.0.1:1")
            .list_work_units(100, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Transport {
                operation: "ListHITs",
                ..
            }
        ));
    }
}
