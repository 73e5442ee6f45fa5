//! HTTP client for the `/ident/*` control-plane endpoints.
//!
//! All bodies are JSON; any 2xx status is success, anything else surfaces
//! the response body in the error. `retrieve` is a GET and encodes its
//! parameters as query strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentError;
use crate::record::IdentityRecord;

/// Client for the identity control plane.
pub struct IdentClient {
    http: reqwest::Client,
    base_url: String,
}

/// Body of `POST /ident/whoami`.
#[derive(Debug, Serialize)]
struct WhoamiRequest<'a> {
    username: &'a str,
    mac: &'a str,
}

/// Response of `POST /ident/whoami`.
#[derive(Debug, Deserialize)]
pub struct WhoamiResponse {
    #[serde(default)]
    pub robot_id: String,
    pub robot_uuid: Uuid,
    pub robot_name: String,
}

/// Response of `GET /ident/retrieve`. A nil `uuid` means the control plane
/// has no record for this robot yet.
#[derive(Debug, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub robot_id: Option<String>,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uuid: Uuid,
}

/// Response of `POST /ident/sync`.
#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
}

impl IdentClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Ask the control plane to mint an identity for this host.
    pub async fn whoami(&self, username: &str, mac: &str) -> Result<WhoamiResponse, IdentError> {
        let resp = self
            .http
            .post(format!("{}/ident/whoami", self.base_url))
            .json(&WhoamiRequest { username, mac })
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Look up an existing identity by username and MAC address.
    pub async fn retrieve(&self, username: &str, mac: &str) -> Result<RetrieveResponse, IdentError> {
        let resp = self
            .http
            .get(format!("{}/ident/retrieve", self.base_url))
            .query(&[("username", username), ("mac_address", mac)])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Push the locally persisted record back to the control plane.
    pub async fn sync(&self, record: &IdentityRecord) -> Result<SyncResponse, IdentError> {
        let resp = self
            .http
            .post(format!("{}/ident/sync", self.base_url))
            .json(record)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// Turn a non-2xx response into an error carrying the body text.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, IdentError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IdentError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Boot an axum mock of the identity control plane. Returns its base URL
    /// and a log of the query params `retrieve` received.
    async fn mock_control_plane() -> (String, Arc<Mutex<Vec<HashMap<String, String>>>>) {
        let queries: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let seen = queries.clone();

        let app = Router::new()
            .route(
                "/ident/whoami",
                post(|Json(body): Json<serde_json::Value>| async move {
                    Json(serde_json::json!({
                        "robot_id": "",
                        "robot_uuid": "00000000-0000-0000-0000-000000000042",
                        "robot_name": format!("robot-{}", body["username"].as_str().unwrap_or("?")),
                    }))
                }),
            )
            .route(
                "/ident/retrieve",
                get(move |Query(params): Query<HashMap<String, String>>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().await.push(params);
                        Json(serde_json::json!({
                            "robot_id": "7",
                            "mac": "aa:bb:cc:dd:ee:ff",
                            "name": "stored",
                            "uuid": "00000000-0000-0000-0000-000000000007",
                        }))
                    }
                }),
            )
            .route(
                "/ident/sync",
                post(|Json(_): Json<serde_json::Value>| async {
                    Json(serde_json::json!({"success": true}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _ = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), queries)
    }

    #[tokio::test]
    async fn whoami_decodes_response() {
        let (base, _) = mock_control_plane().await;
        let client = IdentClient::new(base);
        let resp = client.whoami("alice", "aa:bb").await.unwrap();
        assert_eq!(resp.robot_name, "robot-alice");
        assert_eq!(
            resp.robot_uuid.to_string(),
            "00000000-0000-0000-0000-000000000042"
        );
        assert!(resp.robot_id.is_empty());
    }

    #[tokio::test]
    async fn retrieve_sends_query_params() {
        let (base, queries) = mock_control_plane().await;
        let client = IdentClient::new(base);
        let resp = client.retrieve("bob", "11:22:33:44:55:66").await.unwrap();
        assert_eq!(resp.name, "stored");
        assert_eq!(resp.robot_id.as_deref(), Some("7"));

        let seen = queries.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("username").map(String::as_str), Some("bob"));
        assert_eq!(
            seen[0].get("mac_address").map(String::as_str),
            Some("11:22:33:44:55:66")
        );
    }

    #[tokio::test]
    async fn sync_reports_success() {
        let (base, _) = mock_control_plane().await;
        let client = IdentClient::new(base);
        let record = IdentityRecord {
            mac: "aa:bb".into(),
            name: "r".into(),
            uuid: Uuid::now_v7(),
            robot_id: None,
        };
        let resp = client.sync(&record).await.unwrap();
        assert!(resp.success);
    }

    #[tokio::test]
    async fn non_2xx_surfaces_body_in_error() {
        let app = Router::new().route(
            "/ident/whoami",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "unknown host") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _ = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = IdentClient::new(format!("http://{addr}"));
        let err = client.whoami("alice", "aa:bb").await.unwrap_err();
        match err {
            IdentError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
                assert_eq!(body, "unknown host");
            }
            other => panic!("expected Status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        // Port 1 is never listening.
        let client = IdentClient::new("http://127.0.0.1:1");
        let err = client.retrieve("a", "b").await.unwrap_err();
        assert!(matches!(err, IdentError::Http(_)));
    }

    #[test]
    fn retrieve_response_defaults_to_nil_uuid() {
        let resp: RetrieveResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.uuid.is_nil());
        assert!(resp.robot_id.is_none());
    }
}
