//! Shared blocking HTTP plumbing for the upstream clients.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("harvest-ticker/", env!("CARGO_PKG_VERSION"));

/// Build the client every fetcher shares. The timeout bounds each request.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send a GET and parse the body as JSON.
///
/// Non-2xx responses become `FetchError::Upstream`, using the body's
/// `error`/`message` field as the message when there is one.
pub fn get_json(request: RequestBuilder) -> Result<Value, FetchError> {
    let resp = request.send()?;
    let status = resp.status();
    let url = resp.url().path().to_string();
    let body = resp.text()?;
    debug!(%url, status = status.as_u16(), bytes = body.len(), "upstream response");

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(embedded_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(FetchError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Payload(format!("invalid JSON body: {e}")))
}

/// Error text from common error-body layouts.
pub fn embedded_message(body: &Value) -> Option<String> {
    ["error", "message", "Error Message", "Note", "Information"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP responder for exercising the clients without a network.

    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    pub struct Served {
        pub base_url: String,
        request_line: mpsc::Receiver<String>,
    }

    impl Served {
        /// The request line the server received (e.g. `GET /query?... HTTP/1.1`).
        pub fn request_line(&self) -> String {
            self.request_line.recv().unwrap_or_default()
        }
    }

    /// Answer exactly one request with `status` and a JSON `body`.
    pub fn serve_once(status: u16, body: &str) -> Served {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut first = String::new();
            reader.read_line(&mut first).ok();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }
            let _ = tx.send(first.trim_end().to_string());

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        });

        Served {
            base_url: format!("http://{addr}"),
            request_line: rx,
        }
    }

    /// An address nothing listens on.
    pub fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{closed_port_url, serve_once};
    use super::*;

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn success_body_is_parsed() {
        let served = serve_once(200, r#"{"ok": true}"#);
        let v = get_json(client().get(format!("{}/x", served.base_url))).unwrap();
        assert_eq!(v["ok"], true);
    }

    #[test]
    fn error_status_carries_code_and_message() {
        let served = serve_once(404, r#"{"error": "Category not found"}"#);
        let err = get_json(client().get(format!("{}/api/tech/companies/x", served.base_url))).unwrap_err();
        assert_eq!(
            err,
            FetchError::Upstream {
                status: 404,
                message: "Category not found".into()
            }
        );
    }

    #[test]
    fn invalid_json_is_a_payload_error() {
        let served = serve_once(200, "<html>oops</html>");
        let err = get_json(client().get(served.base_url.clone())).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        let err = get_json(client().get(closed_port_url())).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "{err:?}");
    }
}
