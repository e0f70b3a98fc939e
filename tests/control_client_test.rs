//! Tests for the HTTP control client
//!
//! Runs against a minimal in-process HTTP server so every reply shape the
//! camera can produce is covered without hardware.

use camtether::control::{negotiate_wired_mode, wired_mode_params, CameraControl, Params};
use camtether::net::TransportFactory;
use camtether::testing::interface;
use camtether::{
    CameraCommand, CameraControlClient, CameraEndpoint, ControlFailure, TetherConfig,
    TransportProfile,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `replies` in order (the last one repeats) and record request lines
async fn stub_camera(replies: Vec<(u16, &'static str)>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };

            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let text = String::from_utf8_lossy(&buf);
            let request_line = text.lines().next().unwrap_or_default().to_string();
            seen.lock().unwrap().push(request_line);

            let (status, body) = replies[served.min(replies.len() - 1)];
            served += 1;
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (addr, requests)
}

fn ap_client(addr: SocketAddr) -> CameraControlClient {
    let factory = TransportFactory::new(TetherConfig::default().transport);
    CameraControlClient::new(
        CameraEndpoint::new(format!("http://{}/", addr), TransportProfile::AccessPoint),
        factory.bind(None).unwrap(),
    )
}

#[cfg(test)]
mod control_client_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_requires_2xx_and_body() {
        let (addr, requests) = stub_camera(vec![(200, "{}")]).await;
        let client = ap_client(addr);

        let body = client
            .call(CameraCommand::StartStream, &Params::new())
            .await
            .unwrap();
        assert_eq!(&body[..], b"{}");
        assert_eq!(
            requests.lock().unwrap()[0],
            "GET /gopro/camera/stream/start HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_non_2xx_is_http_error() {
        let (addr, _) = stub_camera(vec![(500, "busy")]).await;
        let client = ap_client(addr);

        let result = client.call(CameraCommand::StopStream, &Params::new()).await;
        assert_eq!(result, Err(ControlFailure::HttpError(500)));
    }

    #[tokio::test]
    async fn test_empty_body_is_failure() {
        let (addr, _) = stub_camera(vec![(200, "")]).await;
        let client = ap_client(addr);

        let result = client
            .call(CameraCommand::StopRecording, &Params::new())
            .await;
        assert_eq!(result, Err(ControlFailure::EmptyBody));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ap_client(addr);
        let result = client.call(CameraCommand::StartRecording, &Params::new()).await;
        assert!(matches!(result, Err(ControlFailure::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_params_become_query_string() {
        let (addr, requests) = stub_camera(vec![(200, "{}")]).await;
        let client = ap_client(addr);

        client
            .call(CameraCommand::WiredUsbControl, &wired_mode_params(true))
            .await
            .unwrap();
        assert_eq!(
            requests.lock().unwrap()[0],
            "GET /gopro/camera/control/wired_usb?p=1 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_negotiation_continues_after_failed_off() {
        let (addr, requests) = stub_camera(vec![(500, "no"), (200, "{}")]).await;
        let client = ap_client(addr);

        assert!(negotiate_wired_mode(&client).await.is_ok());
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("wired_usb?p=0"));
        assert!(requests[1].contains("wired_usb?p=1"));
    }

    #[tokio::test]
    async fn test_interface_bound_client_reaches_camera() {
        let (addr, requests) = stub_camera(vec![(200, "{\"ok\":true}")]).await;
        let factory = TransportFactory::new(TetherConfig::default().transport);
        let loopback = interface("lo", &["127.0.0.1"]);

        let client = CameraControlClient::new(
            CameraEndpoint::new(format!("http://{}/", addr), TransportProfile::WiredInterface),
            factory.bind(Some(&loopback)).unwrap(),
        );
        assert_eq!(client.transport().interface(), Some("lo"));

        assert!(client
            .call(CameraCommand::StartStream, &Params::new())
            .await
            .is_ok());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }
}
