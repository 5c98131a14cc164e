//! GitHub gist remote store.
//!
//! Reads and replaces the `results.jsonl` file of one gist through the
//! REST API. Authentication is a bearer token; the `Accept` header pins the
//! v3 JSON media type.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Credentials, RemoteStore, ENTRY_NAME};
use crate::error::{Error, Result};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default bound on one HTTP request, from connect to the end of the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Gist-backed remote store.
pub struct GistClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl GistClient {
    /// Create a client against the public GitHub API.
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    /// Create a client against a custom API base (GitHub Enterprise, proxies).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            api_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound every request. A stalled server then surfaces as an error
    /// instead of holding the cycle forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint for one gist.
    #[must_use]
    pub fn gist_url(&self, document_id: &str) -> String {
        format!("{}/gists/{document_id}", self.api_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        builder
            .timeout(self.timeout)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(
                reqwest::header::USER_AGENT,
                concat!("gist-reporter/", env!("CARGO_PKG_VERSION")),
            )
    }

    async fn fetch_raw(&self, raw_url: &str, token: &str) -> Result<String> {
        let response = self
            .authorized(self.client.get(raw_url), token)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("Gist raw request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("GitHub returned {status} for raw content: {body}")));
        }

        Ok(response.text().await?)
    }
}

impl Default for GistClient {
    fn default() -> Self {
        Self::new()
    }
}

/// GitHub API response for a gist (only the fields we read).
#[derive(Debug, Deserialize)]
struct GistResponse {
    files: Option<HashMap<String, GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

/// GitHub API request for updating gist files.
#[derive(Debug, Serialize)]
struct GistUpdateRequest<'a> {
    files: HashMap<&'a str, GistFileUpdate<'a>>,
}

#[derive(Debug, Serialize)]
struct GistFileUpdate<'a> {
    content: &'a str,
}

/// What the gist says about the results entry.
#[derive(Debug, PartialEq, Eq)]
enum EntryContent {
    Missing,
    Inline(String),
    Truncated { raw_url: String },
}

fn entry_content(response: GistResponse) -> EntryContent {
    let Some(file) = response.files.and_then(|mut files| files.remove(ENTRY_NAME)) else {
        return EntryContent::Missing;
    };

    match (file.truncated, file.raw_url, file.content) {
        (true, Some(raw_url), _) => EntryContent::Truncated { raw_url },
        (_, _, Some(content)) => EntryContent::Inline(content),
        _ => EntryContent::Missing,
    }
}

fn update_body(content: &str) -> GistUpdateRequest<'_> {
    let mut files = HashMap::with_capacity(1);
    files.insert(ENTRY_NAME, GistFileUpdate { content });
    GistUpdateRequest { files }
}

impl RemoteStore for GistClient {
    async fn download(&self, credentials: &Credentials) -> Result<Option<String>> {
        let url = self.gist_url(&credentials.document_id);

        let response = self
            .authorized(self.client.get(&url), &credentials.token)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("Gist request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("GitHub returned {status}: {body}")));
        }

        let data: GistResponse = response
            .json()
            .await
            .map_err(|e| Error::Remote(format!("Failed to parse gist response: {e}")))?;

        match entry_content(data) {
            EntryContent::Missing => Ok(None),
            EntryContent::Inline(content) => Ok(Some(content)),
            EntryContent::Truncated { raw_url } => {
                tracing::debug!(%raw_url, "gist entry truncated, fetching raw content");
                self.fetch_raw(&raw_url, &credentials.token).await.map(Some)
            }
        }
    }

    async fn upload(&self, credentials: &Credentials, content: &str) -> Result<()> {
        let url = self.gist_url(&credentials.document_id);

        let response = self
            .authorized(self.client.patch(&url), &credentials.token)
            .json(&update_body(content))
            .send()
            .await
            .map_err(|e| Error::Remote(format!("Gist update request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("GitHub returned {status}: {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const TOKEN: &str = "token123";

    /// One request as seen by the stub server.
    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: String,
    }

    struct Stub {
        base: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl Stub {
        fn client(&self) -> GistClient {
            GistClient::with_api_url(&self.base)
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("abc123", TOKEN)
    }

    async fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next()?.split(' ');
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();
        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).into_owned();

        Some(Recorded {
            method,
            path,
            headers,
            body,
        })
    }

    /// Serve one request per connection; `respond` gets the request and the
    /// server's base URL and returns a status and body.
    async fn serve<F>(respond: F) -> Stub
    where
        F: Fn(&Recorded, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let server_base = base.clone();
        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let Some(request) = read_request(&mut stream).await else {
                    continue;
                };
                let (status, body) = respond(&request, &server_base);
                recorded.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Stub { base, requests }
    }

    /// Accept connections and never answer.
    async fn stalled() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        base
    }

    fn assert_authorized(request: &Recorded) {
        assert_eq!(request.headers["authorization"], format!("Bearer {TOKEN}"));
        assert_eq!(request.headers["accept"], "application/vnd.github.v3+json");
        assert!(request.headers["user-agent"].starts_with("gist-reporter/"));
    }

    #[tokio::test]
    async fn test_download_sends_authorized_get() {
        let stub = serve(|_, _| {
            (200, r#"{"files":{"results.jsonl":{"content":"a\nb\n"}}}"#.to_string())
        })
        .await;

        let content = stub.client().download(&credentials()).await.unwrap();

        assert_eq!(content.as_deref(), Some("a\nb\n"));
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/gists/abc123");
        assert_authorized(&requests[0]);
    }

    #[tokio::test]
    async fn test_upload_sends_authorized_patch() {
        let stub = serve(|_, _| (200, "{}".to_string())).await;

        stub.client().upload(&credentials(), "{\"id\":1}\n").await.unwrap();

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].path, "/gists/abc123");
        assert_authorized(&requests[0]);
        assert!(requests[0].headers["content-type"].starts_with("application/json"));

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "files": { "results.jsonl": { "content": "{\"id\":1}\n" } } })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_err() {
        let stub = serve(|_, _| (401, r#"{"message":"Bad credentials"}"#.to_string())).await;
        let client = stub.client();

        let download = client.download(&credentials()).await;
        assert!(matches!(download, Err(Error::Remote(ref m)) if m.contains("401")));

        let upload = client.upload(&credentials(), "x\n").await;
        assert!(matches!(upload, Err(Error::Remote(ref m)) if m.contains("401")));
    }

    #[tokio::test]
    async fn test_not_found_gist_is_err() {
        let stub = serve(|_, _| (404, r#"{"message":"Not Found"}"#.to_string())).await;

        let result = stub.client().download(&credentials()).await;
        assert!(matches!(result, Err(Error::Remote(ref m)) if m.contains("404")));
    }

    #[tokio::test]
    async fn test_missing_entry_downloads_none() {
        let stub = serve(|_, _| (200, r#"{"files":{"other.txt":{"content":"z"}}}"#.to_string())).await;

        assert_eq!(stub.client().download(&credentials()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_truncated_entry_fetches_raw_content() {
        let stub = serve(|request, base| match request.path.as_str() {
            "/gists/abc123" => {
                let body = serde_json::json!({
                    "files": {
                        "results.jsonl": {
                            "content": "partial",
                            "truncated": true,
                            "raw_url": format!("{base}/raw/results.jsonl"),
                        }
                    }
                });
                (200, body.to_string())
            }
            "/raw/results.jsonl" => (200, "full\ncontent\n".to_string()),
            _ => (404, String::new()),
        })
        .await;

        let content = stub.client().download(&credentials()).await.unwrap();

        assert_eq!(content.as_deref(), Some("full\ncontent\n"));
        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, "GET");
        assert_eq!(requests[1].path, "/raw/results.jsonl");
        assert_authorized(&requests[1]);
    }

    #[tokio::test]
    async fn test_upload_then_download_round_trips_content() {
        let document: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let stored = Arc::clone(&document);
        let stub = serve(move |request, _| {
            let mut stored = stored.lock().unwrap();
            if request.method == "PATCH" {
                let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
                *stored = body["files"][ENTRY_NAME]["content"].as_str().map(String::from);
                return (200, "{}".to_string());
            }
            let files = match stored.as_deref() {
                Some(content) => serde_json::json!({ ENTRY_NAME: { "content": content } }),
                None => serde_json::json!({}),
            };
            (200, serde_json::json!({ "files": files }).to_string())
        })
        .await;
        let client = stub.client();
        let content = "{\"msg\":\"caf\u{e9} \\\"quoted\\\"\"}\n\n{\"id\":2}\n";

        assert_eq!(client.download(&credentials()).await.unwrap(), None);
        client.upload(&credentials(), content).await.unwrap();
        assert_eq!(client.download(&credentials()).await.unwrap().as_deref(), Some(content));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let base = stalled().await;
        let client = GistClient::with_api_url(&base).with_timeout(Duration::from_millis(200));

        let download = tokio::time::timeout(Duration::from_secs(5), client.download(&credentials()))
            .await
            .expect("download was not bounded by the request timeout");
        assert!(matches!(download, Err(Error::Remote(_))));

        let upload = tokio::time::timeout(Duration::from_secs(5), client.upload(&credentials(), "x\n"))
            .await
            .expect("upload was not bounded by the request timeout");
        assert!(matches!(upload, Err(Error::Remote(_))));
    }

    #[tokio::test]
    async fn test_stalled_server_fails_the_cycle_without_hanging() {
        use crate::sync::{CycleReport, RemoteStatus, SyncPaths, SyncPipeline};

        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = temp_dir.path().join("a.jsonl");
        std::fs::write(&result, "x\n").unwrap();

        let base = stalled().await;
        let pipeline = SyncPipeline::new(
            GistClient::with_api_url(&base).with_timeout(Duration::from_millis(200)),
            credentials(),
            SyncPaths::new(temp_dir.path()),
        );

        let report = tokio::time::timeout(Duration::from_secs(5), pipeline.process_results())
            .await
            .expect("cycle hung on a stalled server")
            .unwrap();

        assert!(matches!(
            report,
            CycleReport::UploadFailed {
                remote: RemoteStatus::Unreachable(_),
                ..
            }
        ));
        assert!(result.exists());
    }

    fn parse(json: &str) -> EntryContent {
        entry_content(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_gist_url() {
        let client = GistClient::with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(
            client.gist_url("abc123"),
            "https://ghe.example.com/api/v3/gists/abc123"
        );
        assert_eq!(GistClient::new().gist_url("x"), "https://api.github.com/gists/x");
    }

    #[test]
    fn test_entry_present() {
        let entry = parse(r#"{"files":{"results.jsonl":{"content":"a\nb\n"},"other.txt":{"content":"z"}}}"#);
        assert_eq!(entry, EntryContent::Inline("a\nb\n".to_string()));
    }

    #[test]
    fn test_entry_missing() {
        assert_eq!(parse(r#"{"files":{}}"#), EntryContent::Missing);
        assert_eq!(parse(r#"{"id":"abc"}"#), EntryContent::Missing);
        assert_eq!(parse(r#"{"files":{"results.jsonl":{"content":null}}}"#), EntryContent::Missing);
    }

    #[test]
    fn test_entry_truncated_uses_raw_url() {
        let entry = parse(
            r#"{"files":{"results.jsonl":{"content":"partial","truncated":true,"raw_url":"https://gist.githubusercontent.com/raw/1"}}}"#,
        );
        assert_eq!(
            entry,
            EntryContent::Truncated {
                raw_url: "https://gist.githubusercontent.com/raw/1".to_string()
            }
        );
    }

    #[test]
    fn test_update_body_shape() {
        let body = serde_json::to_value(update_body("{\"id\":1}\n")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "files": { "results.jsonl": { "content": "{\"id\":1}\n" } } })
        );
    }
}
