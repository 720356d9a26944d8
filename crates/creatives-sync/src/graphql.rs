//! Minimal GraphQL-over-HTTP channel.
//!
//! Requests are `POST {query, variables}` JSON bodies; responses carry
//! `data` and an optional `errors` array, which is surfaced as its own
//! failure channel separate from transport errors.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GraphqlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("GraphQL errors: {}", .0.join("; "))]
    Remote(Vec<String>),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: &'a V,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
}

/// Decode a GraphQL response body.
///
/// A non-empty `errors` array wins over any partial `data`.
pub fn decode_response<T: DeserializeOwned>(body: &str) -> Result<Option<T>, GraphqlError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    match envelope.errors {
        Some(errors) if !errors.is_empty() => Err(GraphqlError::Remote(
            errors.into_iter().map(|e| e.message).collect(),
        )),
        _ => Ok(envelope.data),
    }
}

/// GraphQL client for the creatives backend.
pub struct GraphqlClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphqlClient {
    /// Create a client for the given endpoint, e.g. `http://localhost:8000/graphql`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one operation and decode its `data` payload.
    pub async fn execute<V, T>(&self, query: &str, variables: &V) -> Result<Option<T>, GraphqlError>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        info!(endpoint = %self.endpoint, "sending GraphQL operation");
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GraphqlError::Server {
                status: status.as_u16(),
                body,
            });
        }
        debug!(bytes = body.len(), "GraphQL response received");
        decode_response(&body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Requests seen by a local test server, raw and in arrival order.
    pub(crate) type Captured = Arc<Mutex<Vec<String>>>;

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    /// Serve the same canned reply to every connection on `127.0.0.1:0`.
    ///
    /// Returns the base URL and the captured requests.
    pub(crate) async fn spawn_server(status: &'static str, body: &'static str) -> (String, Captured) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Captured::default();
        let seen = Arc::clone(&captured);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);
                let reply = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{addr}"), captured)
    }

    /// JSON body of a captured raw request.
    pub(crate) fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        value: String,
    }

    #[test]
    fn decodes_data() {
        let parsed: Option<Echo> = decode_response(r#"{"data": {"value": "hi"}}"#).unwrap();
        assert_eq!(parsed, Some(Echo { value: "hi".into() }));
    }

    #[test]
    fn null_data_is_none() {
        let parsed: Option<Echo> = decode_response(r#"{"data": null}"#).unwrap();
        assert!(parsed.is_none());
        let parsed: Option<Echo> = decode_response(r#"{"data": null, "errors": null}"#).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn errors_array_is_remote_failure() {
        let body = r#"{
            "data": null,
            "errors": [
                {"message": "Question 9 not found", "path": ["augmentQuestion"]},
                {"message": "rate limited"}
            ]
        }"#;
        let err = decode_response::<Echo>(body).unwrap_err();
        match err {
            GraphqlError::Remote(messages) => {
                assert_eq!(messages, vec!["Question 9 not found", "rate limited"]);
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn empty_errors_array_is_ignored() {
        let parsed: Option<Echo> =
            decode_response(r#"{"data": {"value": "ok"}, "errors": []}"#).unwrap();
        assert_eq!(parsed.unwrap().value, "ok");
    }

    #[test]
    fn malformed_body_is_json_error() {
        let err = decode_response::<Echo>("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, GraphqlError::Json(_)));
    }

    #[test]
    fn request_body_shape() {
        let variables = serde_json::json!({"id": "1"});
        let body = serde_json::to_value(GraphqlRequest {
            query: "query { ping }",
            variables: &variables,
        })
        .unwrap();
        assert_eq!(body["query"], "query { ping }");
        assert_eq!(body["variables"]["id"], "1");
    }

    #[tokio::test]
    async fn execute_posts_query_and_variables_with_token() {
        let (base, captured) = spawn_server("200 OK", r#"{"data": {"value": "hi"}}"#).await;
        let client = GraphqlClient::new(format!("{base}/graphql")).with_token("tok");

        let data: Option<Echo> = client
            .execute("query Echo($id: ID!) { value }", &serde_json::json!({"id": "1"}))
            .await
            .unwrap();
        assert_eq!(data, Some(Echo { value: "hi".into() }));

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let raw = &requests[0];
        assert!(raw.starts_with("POST /graphql "));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok\r\n"));
        let body = request_body(raw);
        assert_eq!(body["query"], "query Echo($id: ID!) { value }");
        assert_eq!(body["variables"], serde_json::json!({"id": "1"}));
    }

    #[tokio::test]
    async fn no_token_sends_no_authorization() {
        let (base, captured) = spawn_server("200 OK", r#"{"data": null}"#).await;
        let client = GraphqlClient::new(format!("{base}/graphql"));
        let data: Option<Echo> = client.execute("{ value }", &serde_json::json!({})).await.unwrap();
        assert!(data.is_none());
        assert!(!captured.lock().unwrap()[0].to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn non_success_status_is_server_error() {
        let (base, _) = spawn_server("500 Internal Server Error", r#"{"detail": "boom"}"#).await;
        let client = GraphqlClient::new(format!("{base}/graphql"));
        let err = client
            .execute::<_, Echo>("{ value }", &serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            GraphqlError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"detail": "boom"}"#);
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }
}
