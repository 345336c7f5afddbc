//! Minimal HTTP/1.1 server standing in for the game site in integration tests.
//!
//! Each path has a canned response: a body plus a sequence of status codes
//! returned one per request (the last one repeats). Requests per path are
//! counted so tests can assert retry behavior. Unknown paths get 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    statuses: Vec<u16>,
    content_type: &'static str,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<String, Route>,
    hits: HashMap<String, usize>,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct SiteServer {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl SiteServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Site root without trailing slash, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Serve `html` with 200 at `path`.
    pub fn page(&self, path: &str, html: &str) {
        self.route(path, &[200], "text/html; charset=utf-8", html.as_bytes().to_vec());
    }

    /// Serve `body` with 200 at `path`.
    pub fn file(&self, path: &str, body: Vec<u8>) {
        self.route(path, &[200], "application/x-shockwave-flash", body);
    }

    /// Answer requests to `path` with `statuses` in turn; the last repeats.
    /// 2xx responses carry `body`.
    pub fn statuses(&self, path: &str, statuses: &[u16], body: Vec<u8>) {
        self.route(path, statuses, "application/x-shockwave-flash", body);
    }

    fn route(&self, path: &str, statuses: &[u16], content_type: &'static str, body: Vec<u8>) {
        assert!(!statuses.is_empty());
        self.state.lock().unwrap().routes.insert(
            path.to_string(),
            Route {
                statuses: statuses.to_vec(),
                content_type,
                body,
            },
        );
    }

    /// Requests received for `path` (query ignored).
    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let Some(path) = request_path(&request) else {
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n");
        return;
    };

    let (status, content_type, body) = {
        let mut state = state.lock().unwrap();
        let hit = {
            let count = state.hits.entry(path.clone()).or_insert(0);
            *count += 1;
            *count
        };
        match state.routes.get(&path) {
            Some(route) => {
                let status = route.statuses[(hit - 1).min(route.statuses.len() - 1)];
                let body = if (200..300).contains(&status) {
                    route.body.clone()
                } else {
                    format!("status {}", status).into_bytes()
                };
                (status, route.content_type, body)
            }
            None => (404, "text/plain", b"not found".to_vec()),
        }
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

/// Path of the request line, query stripped.
fn request_path(request: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(request).ok()?;
    let target = text.lines().next()?.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
