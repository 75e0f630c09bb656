//! Transmission JSON-RPC client.
//!
//! Transmission guards its RPC endpoint against CSRF with a session id: the
//! first request is answered with `409 Conflict` and an
//! `X-Transmission-Session-Id` header, which must be echoed on every
//! following request. The id can change at any time (daemon restart), so a
//! `409` is always answered by retrying once with the new id.

use crate::client::{Added, DownloadClient, Removed};
use crate::error::{ErrorKind, Result};
use crate::torrent::TorrentRef;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

#[derive(Serialize)]
struct Request<'a, A> {
    method: &'a str,
    arguments: A,
}

#[derive(Deserialize)]
struct Response<T> {
    result: String,
    arguments: Option<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct TorrentAdd<'a> {
    filename: &'a str,
    download_dir: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TorrentAddResult {
    torrent_added: Option<Torrent>,
    torrent_duplicate: Option<Torrent>,
}

#[derive(Serialize)]
struct TorrentGet<'a> {
    fields: &'a [&'a str],
}

#[derive(Deserialize)]
struct TorrentGetResult {
    torrents: Vec<Torrent>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct TorrentRemove {
    ids: Vec<i64>,
    delete_local_data: bool,
}

#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct Torrent {
    id: i64,
    name: String,
}

/// Decode an RPC response body, turning a non-`success` result into an error.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let response: Response<T> = serde_json::from_slice(body).or_raise(|| ErrorKind::InvalidResponse)?;
    if response.result != "success" {
        exn::bail!(ErrorKind::Rpc(response.result));
    }
    match response.arguments {
        Some(arguments) => Ok(arguments),
        None => exn::bail!(ErrorKind::InvalidResponse),
    }
}

/// Client for a Transmission daemon.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use zimsync_client::TransmissionClient;
///
/// # fn example() -> zimsync_client::error::Result<()> {
/// let client = TransmissionClient::new("http://localhost:9091/transmission/rpc", Duration::from_secs(30))?
///     .with_credentials("admin", "secret");
/// # Ok(())
/// # }
/// ```
pub struct TransmissionClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
    session: RwLock<Option<String>>,
}

impl TransmissionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            exn::bail!(ErrorKind::Configuration(format!("endpoint must be an HTTP(S) URL: {endpoint}")));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Configuration("cannot build HTTP client".to_string()))?;
        Ok(Self {
            http,
            endpoint,
            credentials: None,
            session: RwLock::new(None),
        })
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    async fn call<A: Serialize + Sync, T: DeserializeOwned>(&self, method: &str, arguments: A) -> Result<T> {
        let request = Request { method, arguments };
        // One retry: the first 409 hands us the session id to use.
        for _ in 0..2 {
            let mut builder = self.http.post(&self.endpoint).json(&request);
            if let Some((username, password)) = &self.credentials {
                builder = builder.basic_auth(username, Some(password));
            }
            if let Some(session) = self.session.read().await.as_deref() {
                builder = builder.header(SESSION_HEADER, session);
            }
            let response = builder.send().await.or_raise(|| ErrorKind::Network)?;
            match response.status() {
                StatusCode::CONFLICT => {
                    let session = response
                        .headers()
                        .get(SESSION_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    if session.is_none() {
                        exn::bail!(ErrorKind::InvalidResponse);
                    }
                    tracing::debug!("Transmission session id refreshed");
                    *self.session.write().await = session;
                },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => exn::bail!(ErrorKind::Unauthorized),
                status if status.is_success() => {
                    let body = response.bytes().await.or_raise(|| ErrorKind::Network)?;
                    return decode(&body);
                },
                status => exn::bail!(ErrorKind::Rpc(format!("HTTP {status}"))),
            }
        }
        exn::bail!(ErrorKind::InvalidResponse)
    }
}

#[async_trait]
impl DownloadClient for TransmissionClient {
    fn name(&self) -> &str {
        "transmission"
    }

    #[instrument(skip(self), fields(torrent = %torrent))]
    async fn add(&self, torrent: &TorrentRef, destination: &Path) -> Result<Added> {
        let Some(download_dir) = destination.to_str() else {
            exn::bail!(ErrorKind::Configuration(format!("non UTF-8 destination: {}", destination.display())));
        };
        let arguments = TorrentAdd {
            filename: torrent.as_str(),
            download_dir,
        };
        let result: TorrentAddResult = self.call("torrent-add", arguments).await?;
        match (result.torrent_added, result.torrent_duplicate) {
            (Some(added), _) => {
                tracing::debug!(id = added.id, name = %added.name, "Torrent added");
                Ok(Added::Queued)
            },
            (None, Some(duplicate)) => {
                tracing::info!(id = duplicate.id, name = %duplicate.name, "Torrent already known to client");
                Ok(Added::Duplicate)
            },
            (None, None) => exn::bail!(ErrorKind::InvalidResponse),
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<Removed> {
        let result: TorrentGetResult = self.call("torrent-get", TorrentGet { fields: &["id", "name"] }).await?;
        let ids: Vec<i64> = result.torrents.iter().filter(|t| t.name == name).map(|t| t.id).collect();
        if ids.is_empty() {
            tracing::warn!(name, "Client could not find torrent");
            return Ok(Removed::NotFound);
        }
        let _: Empty = self.call("torrent-remove", TorrentRemove { ids, delete_local_data: true }).await?;
        tracing::debug!(name, "Torrent removed and data deleted");
        Ok(Removed::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    #[test]
    fn test_request_encoding() {
        let request = Request {
            method: "torrent-add",
            arguments: TorrentAdd {
                filename: "https://download.kiwix.org/zim/wikipedia/wikipedia_en_all_nopic_2020-06.zim.torrent",
                download_dir: "/srv/zim",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "method": "torrent-add",
                "arguments": {
                    "filename": "https://download.kiwix.org/zim/wikipedia/wikipedia_en_all_nopic_2020-06.zim.torrent",
                    "download-dir": "/srv/zim",
                }
            })
        );
        let remove = serde_json::to_value(TorrentRemove { ids: vec![3], delete_local_data: true }).unwrap();
        assert_eq!(remove, serde_json::json!({ "ids": [3], "delete-local-data": true }));
    }

    #[test]
    fn test_decode_added() {
        let body = br#"{"result":"success","arguments":{"torrent-added":{"id":7,"name":"a_2020-06.zim","hashString":"abc"}}}"#;
        let result: TorrentAddResult = decode(body).unwrap();
        assert_eq!(result.torrent_added.unwrap().id, 7);
        assert!(result.torrent_duplicate.is_none());
    }

    #[test]
    fn test_decode_torrents() {
        let body = br#"{"result":"success","arguments":{"torrents":[{"id":1,"name":"a_2020-01.zim"},{"id":2,"name":"a_2020-06.zim"}]}}"#;
        let result: TorrentGetResult = decode(body).unwrap();
        assert_eq!(result.torrents.len(), 2);
        assert_eq!(result.torrents[1].name, "a_2020-06.zim");
    }

    #[test]
    fn test_decode_empty_arguments() {
        let _: Empty = decode(br#"{"result":"success","arguments":{}}"#).unwrap();
    }

    #[rstest]
    #[case(br#"{"result":"duplicate torrent","arguments":{}}"#.as_slice(), true)]
    #[case(br#"{"result":"success"}"#.as_slice(), false)]
    #[case(b"<html>not json</html>".as_slice(), false)]
    fn test_decode_failures(#[case] body: &[u8], #[case] refused: bool) {
        let err = decode::<Empty>(body).unwrap_err();
        assert_eq!(matches!(&*err, ErrorKind::Rpc(_)), refused);
    }

    #[rstest]
    #[case("localhost:9091/transmission/rpc")]
    #[case("ftp://localhost/transmission/rpc")]
    fn test_new_rejects_non_http_endpoint(#[case] endpoint: &str) {
        let err = TransmissionClient::new(endpoint, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));
    }

    /// A request as received by the stub daemon.
    struct Seen {
        session: Option<String>,
        authorization: Option<String>,
        body: serde_json::Value,
    }

    /// One scripted reply: status, session id header, body.
    type Reply = (u16, Option<&'static str>, &'static str);

    /// Answers one connection per scripted reply, in order, and hands back
    /// every request it read.
    async fn daemon(replies: Vec<Reply>) -> (String, JoinHandle<Vec<Seen>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/transmission/rpc", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, session, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut socket).await);
                let session = session.map(|id| format!("{SESSION_HEADER}: {id}\r\n")).unwrap_or_default();
                let reply = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{session}\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            seen
        });
        (endpoint, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> Seen {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let read = socket.read(&mut chunk).await.unwrap();
            assert!(read > 0, "connection closed before the request head ended");
            buffer.extend_from_slice(&chunk[..read]);
            if let Some(at) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                break at + 4;
            }
        };
        let head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();
        let header = |name: &str| {
            head.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim().eq_ignore_ascii_case(name).then(|| value.trim().to_string())
            })
        };
        let length: usize = header("content-length").and_then(|value| value.parse().ok()).unwrap_or(0);
        while buffer.len() < head_end + length {
            let read = socket.read(&mut chunk).await.unwrap();
            assert!(read > 0, "connection closed before the request body ended");
            buffer.extend_from_slice(&chunk[..read]);
        }
        Seen {
            session: header(SESSION_HEADER),
            authorization: header("authorization"),
            body: serde_json::from_slice(&buffer[head_end..head_end + length]).unwrap(),
        }
    }

    fn client(endpoint: &str) -> TransmissionClient {
        TransmissionClient::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    fn torrent() -> TorrentRef {
        TorrentRef::from("http://mirror.local/zim/wikipedia/wikipedia_en_all_nopic_2020-06.zim.torrent".to_string())
    }

    const GET_TORRENTS: &str = r#"{"result":"success","arguments":{"torrents":[{"id":1,"name":"wikipedia_en_all_nopic_2020-01.zim"},{"id":2,"name":"wikipedia_en_all_nopic_2020-02.zim"}]}}"#;

    #[tokio::test]
    async fn test_add_answers_session_challenge() {
        let (endpoint, daemon) = daemon(vec![
            (409, Some("abc123"), ""),
            (200, None, r#"{"result":"success","arguments":{"torrent-added":{"id":1,"name":"wikipedia_en_all_nopic_2020-06.zim"}}}"#),
        ])
        .await;
        let added = client(&endpoint).add(&torrent(), Path::new("/srv/zim")).await.unwrap();
        assert_eq!(added, Added::Queued);

        let seen = daemon.await.unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].session, None);
        assert_eq!(seen[1].session.as_deref(), Some("abc123"));
        assert_eq!(
            seen[1].body,
            json!({
                "method": "torrent-add",
                "arguments": {
                    "filename": "http://mirror.local/zim/wikipedia/wikipedia_en_all_nopic_2020-06.zim.torrent",
                    "download-dir": "/srv/zim",
                }
            })
        );
    }

    #[tokio::test]
    async fn test_add_reports_duplicate() {
        let (endpoint, daemon) = daemon(vec![(
            200,
            None,
            r#"{"result":"success","arguments":{"torrent-duplicate":{"id":4,"name":"wikipedia_en_all_nopic_2020-06.zim"}}}"#,
        )])
        .await;
        let added = client(&endpoint).add(&torrent(), Path::new("/srv/zim")).await.unwrap();
        assert_eq!(added, Added::Duplicate);
        assert_eq!(daemon.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_without_session_id() {
        let (endpoint, daemon) = daemon(vec![(409, None, "")]).await;
        let err = client(&endpoint).add(&torrent(), Path::new("/srv/zim")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidResponse));
        assert_eq!(daemon.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_sends_basic_auth() {
        let (endpoint, daemon) = daemon(vec![(401, None, "")]).await;
        let client = client(&endpoint).with_credentials("admin", "secret");
        let err = client.remove("wikipedia_en_all_nopic_2020-01.zim").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unauthorized));

        let seen = daemon.await.unwrap();
        assert_eq!(seen[0].authorization.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let (endpoint, daemon) = daemon(vec![(500, None, "")]).await;
        let err = client(&endpoint).remove("wikipedia_en_all_nopic_2020-01.zim").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Rpc(message) if message.contains("500")));
        daemon.await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_unknown_torrent() {
        let (endpoint, daemon) = daemon(vec![(200, None, GET_TORRENTS)]).await;
        let removed = client(&endpoint).remove("wikipedia_en_all_nopic_2019-12.zim").await.unwrap();
        assert_eq!(removed, Removed::NotFound);

        let seen = daemon.await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].body["method"], "torrent-get");
    }

    #[tokio::test]
    async fn test_remove_deletes_matching_torrent() {
        let (endpoint, daemon) = daemon(vec![
            (409, Some("s1"), ""),
            (200, None, GET_TORRENTS),
            (200, None, r#"{"result":"success","arguments":{}}"#),
        ])
        .await;
        let removed = client(&endpoint).remove("wikipedia_en_all_nopic_2020-02.zim").await.unwrap();
        assert_eq!(removed, Removed::Deleted);

        let seen = daemon.await.unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].session.as_deref(), Some("s1"));
        assert_eq!(
            seen[2].body,
            json!({ "method": "torrent-remove", "arguments": { "ids": [2], "delete-local-data": true } })
        );
    }
}
