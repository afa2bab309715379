use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{WidgetError, WidgetOptions};

/// Why a reply round-trip produced no usable reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("reply service answered with status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    Decode(String),

    #[error("response has no string `reply` field")]
    MissingReply,
}

/// Turns one user message into one bot reply.
pub trait ReplyService: Clone + Send + Sync + 'static {
    fn reply(&self, message: &str) -> impl Future<Output = Result<String, ReplyError>> + Send;

    /// Points the service at another endpoint. Services without one ignore it.
    fn set_endpoint(&mut self, _endpoint: &str) {}
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
}

/// Extracts the `reply` string from a response body.
pub fn parse_reply(body: &str) -> Result<String, ReplyError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ReplyError::Decode(e.to_string()))?;
    value
        .get("reply")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ReplyError::MissingReply)
}

/// Reply service reached over HTTP: `POST {endpoint}` with `{"message": ..}`.
#[derive(Debug, Clone)]
pub struct HttpReplyService {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpReplyService {
    pub fn new(endpoint: &str, options: &WidgetOptions) -> Result<Self, WidgetError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| WidgetError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReplyService for HttpReplyService {
    fn set_endpoint(&mut self, endpoint: &str) {
        self.endpoint = endpoint.to_string();
    }

    async fn reply(&self, message: &str) -> Result<String, ReplyError> {
        log::debug!("POST {} ({} chars)", self.endpoint, message.chars().count());

        let response = self
            .http
            .post(&self.endpoint)
            .json(&ReplyRequest { message })
            .send()
            .await
            .map_err(|e| ReplyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplyError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReplyError::Network(e.to_string()))?;

        parse_reply(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/chat", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn parses_reply_field() {
        assert_eq!(parse_reply(r#"{"reply":"Hi there"}"#), Ok("Hi there".into()));
    }

    #[test]
    fn missing_or_non_string_reply_is_an_error() {
        assert_eq!(parse_reply(r#"{"answer":"x"}"#), Err(ReplyError::MissingReply));
        assert_eq!(parse_reply(r#"{"reply":42}"#), Err(ReplyError::MissingReply));
        assert_eq!(parse_reply(r#"{"reply":null}"#), Err(ReplyError::MissingReply));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        assert!(matches!(
            parse_reply("<html>502 Bad Gateway</html>"),
            Err(ReplyError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn posts_message_as_json() {
        let (url, server) = serve_once("200 OK", r#"{"reply":"Hi there"}"#).await;
        let service = HttpReplyService::new(&url, &WidgetOptions::default()).unwrap();

        let reply = service.reply("Hello").await;
        assert_eq!(reply, Ok("Hi there".to_string()));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"message":"Hello"}"#));
    }

    #[test]
    fn set_endpoint_repoints_service() {
        let mut service =
            HttpReplyService::new(crate::types::DEFAULT_ENDPOINT, &WidgetOptions::default())
                .unwrap();
        assert_eq!(service.endpoint(), crate::types::DEFAULT_ENDPOINT);

        service.set_endpoint("https://bot.example/chat");
        assert_eq!(service.endpoint(), "https://bot.example/chat");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"reply":"x"}"#).await;
        let service = HttpReplyService::new(&url, &WidgetOptions::default()).unwrap();

        assert_eq!(service.reply("Hello").await, Err(ReplyError::Status(500)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/chat", listener.local_addr().unwrap());
        drop(listener);

        let service = HttpReplyService::new(&url, &WidgetOptions::default()).unwrap();
        assert!(matches!(
            service.reply("Hello").await,
            Err(ReplyError::Network(_))
        ));
    }
}
