// Local HTTP server with canned responses for client tests

use crate::http::BROWSER_USER_AGENT;
use reqwest::Client;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestServer {
    base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl TestServer {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request heads received, one per canned response; waits until all were served
    pub async fn requests(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

/// Raw HTTP/1.1 response; every response closes its connection
pub fn respond(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {} Canned\r\n", status);
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    response
}

/// Serve `responses` in order, one connection each, on 127.0.0.1
pub async fn serve(responses: Vec<String>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            requests.push(String::from_utf8_lossy(&head).into_owned());
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        }
        requests
    });

    TestServer { base_url, handle }
}

/// Client for the local server, bypassing any proxy from the environment
pub fn local_client() -> Client {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap()
}
