//! HTTP status server for station monitoring.
//!
//! Provides a `/status` endpoint that returns the connection manager's state
//! as JSON. Uses `tiny_http` which works on both host and ESP32 (via std::net).
//!
//! # Example Response
//!
//! ```json
//! {
//!   "state": "address_acquired",
//!   "ssid": "HomeNet",
//!   "attempts": 0,
//!   "max_retry": 5,
//!   "outcome": { "status": "connected", "address": "10.0.0.5", ... },
//!   "cycles": 1,
//!   "association_requests": 3,
//!   "disassociations": 2,
//!   "connected": 1,
//!   "failed": 0
//! }
//! ```

use log::{error, info, warn};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

/// Default port for the status server.
pub const DEFAULT_STATUS_PORT: u16 = 8080;

/// Anything that can describe itself as a JSON status document.
pub trait StatusSource: Send + Sync {
    /// Current status as a JSON object.
    fn status_json(&self) -> String;
}

/// HTTP status server.
///
/// Runs in a background thread. Drop it to stop the server.
pub struct StatusServer {
    local_addr: SocketAddr,
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl StatusServer {
    /// Start serving `source` on `bind_addr:port` (`None` binds 0.0.0.0).
    ///
    /// Port 0 picks a free port; see [`local_addr`](Self::local_addr).
    pub fn start(
        bind_addr: Option<IpAddr>,
        port: u16,
        source: Arc<dyn StatusSource>,
    ) -> Result<Self, std::io::Error> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        let local_addr = server.server_addr().to_ip().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "status server is not on a TCP socket")
        })?;

        info!("Status server listening on http://{}/status", local_addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, source, shutdown_clone);
        });

        Ok(Self {
            local_addr,
            handle: Some(handle),
            shutdown,
        })
    }

    fn run_server(server: Server, source: Arc<dyn StatusSource>, shutdown: Arc<AtomicBool>) {
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header");
        let allow_get = Header::from_bytes(&b"Allow"[..], &b"GET"[..]).expect("static header");

        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("Status server shutting down");
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            };

            if request.method() != &Method::Get {
                let response = Response::from_string("Method Not Allowed")
                    .with_status_code(405)
                    .with_header(allow_get.clone());
                let _ = request.respond(response);
                continue;
            }

            let response = match route(request.url()) {
                Route::Status => Response::from_string(source.status_json())
                    .with_header(content_type.clone())
                    .with_status_code(200),
                Route::NotFound => Response::from_string("Not Found").with_status_code(404),
            };

            if let Err(e) = request.respond(response) {
                warn!("Failed to send response: {}", e);
            }
        }
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the server. May take up to 100ms due to the polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Status,
    NotFound,
}

fn route(path: &str) -> Route {
    let path = path.split('?').next().unwrap_or(path);
    match path {
        "/" | "/status" | "/status/" => Route::Status,
        _ => Route::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    struct FixedStatus;

    impl StatusSource for FixedStatus {
        fn status_json(&self) -> String {
            r#"{"state":"idle"}"#.to_string()
        }
    }

    #[test]
    fn test_routes() {
        assert_eq!(route("/status"), Route::Status);
        assert_eq!(route("/status/"), Route::Status);
        assert_eq!(route("/status?pretty=1"), Route::Status);
        assert_eq!(route("/"), Route::Status);
        assert_eq!(route("/stats"), Route::NotFound);
    }

    #[test]
    fn test_serves_status() {
        let mut server =
            StatusServer::start(Some("127.0.0.1".parse().unwrap()), 0, Arc::new(FixedStatus))
                .unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).unwrap();

        assert!(body.starts_with("HTTP/1.1 200"));
        assert!(body.contains(r#"{"state":"idle"}"#));
        server.stop();
    }

    #[test]
    fn test_rejects_non_get() {
        let server =
            StatusServer::start(Some("127.0.0.1".parse().unwrap()), 0, Arc::new(FixedStatus))
                .unwrap();

        let mut stream = TcpStream::connect(server.local_addr()).unwrap();
        stream
            .write_all(
                b"POST /status HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            )
            .unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).unwrap();

        assert!(body.starts_with("HTTP/1.1 405"));
    }
}
