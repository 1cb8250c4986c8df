use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{BackendError, ConversionBackend, ConversionRequest, Resolution};

/// Local conversion service address used when none is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5001";

/// Per-request deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Serialize)]
struct WireRequest<'a> {
    text: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    result: Option<String>,
}

/// `GET /health` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub vidyut_available: bool,
    #[serde(default)]
    pub supported_scripts: Vec<String>,
}

/// `GET /scripts` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceScripts {
    pub scripts: Vec<String>,
    pub count: usize,
}

/// Conversion through a local HTTP service.
///
/// Protocol: `POST {base}/transliterate` with `{text, source, target}`,
/// answered by `{result}`. Any transport error, non-2xx status or
/// undecodable body is an error. An empty or missing `result` resolves to
/// the input text.
pub struct RemoteServiceConversion {
    base_url: String,
    agent: ureq::Agent,
}

impl RemoteServiceConversion {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            base_url: base_url.into(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> Result<String, BackendError> {
        let url = self.endpoint(path);
        self.agent
            .get(&url)
            .call()
            .map_err(|e| http_error(&url, e))?
            .into_body()
            .read_to_string()
            .map_err(|e| http_error(&url, e))
    }

    /// Query the service's health endpoint.
    pub fn health(&self) -> Result<ServiceHealth, BackendError> {
        let body = self.get("health")?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Ask the service which script identifiers it understands.
    pub fn scripts(&self) -> Result<ServiceScripts, BackendError> {
        let body = self.get("scripts")?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl Default for RemoteServiceConversion {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT)
    }
}

fn http_error(url: &str, err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::StatusCode(code) => BackendError::Status(code),
        other => BackendError::Http(format!("{url}: {other}")),
    }
}

impl ConversionBackend for RemoteServiceConversion {
    fn name(&self) -> &str {
        "remote"
    }

    fn resolution(&self) -> Resolution {
        Resolution::Deferred
    }

    fn convert(&self, request: &ConversionRequest) -> Result<String, BackendError> {
        let url = self.endpoint("transliterate");
        let body = serde_json::to_string(&WireRequest {
            text: &request.text,
            source: &request.source,
            target: &request.target,
        })
        .map_err(|e| BackendError::Decode(e.to_string()))?;

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(|e| http_error(&url, e))?
            .into_body()
            .read_to_string()
            .map_err(|e| http_error(&url, e))?;

        let decoded: WireResponse =
            serde_json::from_str(&response).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(decoded
            .result
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| request.text.clone()))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Minimal single-threaded HTTP/1.1 responder for exercising the client.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    pub struct StubRequest {
        pub method: String,
        pub path: String,
        pub body: String,
    }

    pub struct StubService {
        pub url: String,
        pub requests: mpsc::Receiver<StubRequest>,
    }

    /// Serve requests with `respond(request) -> (status, body)` until the
    /// test process exits.
    pub fn serve<F>(respond: F) -> StubService
    where
        F: Fn(&StubRequest) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let Some(request) = read_request(&stream) else {
                    continue;
                };
                let (status, body) = respond(&request);
                write_response(stream, status, &body);
                let _ = tx.send(request);
            }
        });
        StubService { url, requests: rx }
    }

    fn read_request(stream: &TcpStream) -> Option<StubRequest> {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let mut parts = line.split_whitespace();
        let method = parts.next()?.to_string();
        let path = parts.next()?.to_string();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).ok()?;
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().ok()?;
                }
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).ok()?;
        Some(StubRequest {
            method,
            path,
            body: String::from_utf8(body).ok()?,
        })
    }

    fn write_response(mut stream: TcpStream, status: u16, body: &str) {
        let reason = if status < 400 { "OK" } else { "Error" };
        let _ = write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.flush();
    }
}
