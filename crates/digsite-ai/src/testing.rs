//! Test doubles: a scripted [`Transport`] and a one-shot HTTP stub server.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::transport::{GenerateRequest, GenerateResponse, Transport};
use crate::TransportError;

pub fn solid_image(r: u8, g: u8, b: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([r, g, b])))
}

pub fn ok(text: &str) -> Result<GenerateResponse, TransportError> {
    Ok(GenerateResponse {
        response: text.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct Call {
    pub request: GenerateRequest,
    pub timeout: Duration,
    pub at: Instant,
}

/// Replays scripted outcomes in order and records every call.
pub struct MockTransport {
    script: Mutex<VecDeque<Result<GenerateResponse, TransportError>>>,
    models: Result<Vec<String>, TransportError>,
    calls: Mutex<Vec<Call>>,
    list_calls: Mutex<usize>,
}

impl MockTransport {
    pub fn new(script: Vec<Result<GenerateResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            models: Ok(Vec::new()),
            calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![ok(text)])
    }

    pub fn with_models(mut self, models: Result<Vec<String>, TransportError>) -> Self {
        self.models = models;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            request: request.clone(),
            timeout,
            at: Instant::now(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
    }

    async fn list_models(&self, _timeout: Duration) -> Result<Vec<String>, TransportError> {
        *self.list_calls.lock().unwrap() += 1;
        self.models.clone()
    }
}

/// Minimal HTTP/1.1 server answering each connection with the next canned response.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<tokio::sync::Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let seen = requests.clone();

        let task = tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let raw = read_request(&mut stream).await.unwrap_or_default();
                seen.lock().await.push(raw);
                let reply = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Accepts and reads requests but never answers.
    pub async fn start_silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let seen = requests.clone();

        let task = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let seen = seen.clone();
                tokio::spawn(async move {
                    let raw = read_request(&mut stream).await.unwrap_or_default();
                    seen.lock().await.push(raw);
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// URL of a port nothing listens on.
    pub async fn closed_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
