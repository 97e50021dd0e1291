//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a backend that answers every request with what it received.
///
/// The body is the request line followed by the request headers, one per
/// line. When the request carries a `Content-Length` body, a blank line and
/// that body follow, so tests can assert on what the proxy actually sent.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                let head_end = loop {
                    if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos;
                    }
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => received.extend_from_slice(&buf[..n]),
                    }
                };

                let head = String::from_utf8_lossy(&received[..head_end]).replace("\r\n", "\n");
                let content_length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);

                let body_start = head_end + 4;
                while received.len() < body_start + content_length {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => received.extend_from_slice(&buf[..n]),
                    }
                }

                let mut echoed = head;
                if content_length > 0 {
                    echoed.push_str("\n\n");
                    echoed.push_str(&String::from_utf8_lossy(
                        &received[body_start..body_start + content_length],
                    ));
                }

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    echoed.len(),
                    echoed
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A fresh directory with `index.html` and `css/site.css`.
#[allow(dead_code)]
pub fn site_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "upstream-dispatch-it-{name}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(dir.join("css")).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>www</h1>").unwrap();
    std::fs::write(dir.join("css").join("site.css"), "body{}").unwrap();
    dir
}
