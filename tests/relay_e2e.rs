//! End-to-end tests using a real WebSocket client against a live server.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use relay::server::{serve_with_shutdown, AppState};
use relay::static_files::StaticResponder;
use relay::websocket::HubConfig;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct TestServer {
    addr: SocketAddr,
    state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
    _root: TempDir,
}

impl TestServer {
    fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    async fn connect(&self) -> WsStream {
        let (ws, _) = connect_async(self.ws_url()).await.unwrap();
        ws
    }

    async fn wait_for_connections(&self, n: usize) {
        wait_for_connections(&self.state, n).await;
    }
}

/// Wait until the hub has registered exactly `n` connections.
async fn wait_for_connections(state: &AppState, n: usize) {
    timeout(TIMEOUT, async {
        while state.connection_count().await != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("hub never reached {n} connections"));
}

fn write_site(root: &Path) {
    std::fs::create_dir_all(root.join("public")).unwrap();
    std::fs::write(root.join("public/index.html"), "<!doctype html><h1>relay</h1>").unwrap();
    std::fs::write(root.join("style.css"), "body { font-family: sans-serif }").unwrap();
}

/// Boot a server on an ephemeral port.
async fn boot_server() -> TestServer {
    let root = tempfile::tempdir().unwrap();
    write_site(root.path());

    let state = AppState::new(
        HubConfig::default(),
        StaticResponder::new(root.path(), "public/index.html"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_state = state.clone();
    let handle = tokio::spawn(async move {
        serve_with_shutdown(listener, server_state, async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    TestServer {
        addr,
        state,
        shutdown: Some(shutdown_tx),
        handle,
        _root: root,
    }
}

/// Next text frame, or None if nothing arrives within `wait`.
async fn recv_text(ws: &mut WsStream, wait: Duration) -> Option<String> {
    loop {
        match timeout(wait, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return Some(text),
            Ok(Some(Ok(Message::Ping(_)))) | Ok(Some(Ok(Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    timeout(TIMEOUT, stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&response).to_lowercase()
}

#[tokio::test]
async fn lone_client_message_goes_nowhere() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    server.wait_for_connections(1).await;

    x.send(Message::Text(r#"{"a":1}"#.into())).await.unwrap();

    assert_eq!(recv_text(&mut x, QUIET).await, None);
    assert_eq!(server.state.connection_count().await, 1);
}

#[tokio::test]
async fn message_reaches_peer_but_not_sender() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    let mut y = server.connect().await;
    server.wait_for_connections(2).await;

    x.send(Message::Text(r#"{"msg":"hi"}"#.into())).await.unwrap();

    assert_eq!(recv_text(&mut y, TIMEOUT).await.as_deref(), Some(r#"{"msg":"hi"}"#));
    assert_eq!(recv_text(&mut x, QUIET).await, None);
}

#[tokio::test]
async fn invalid_json_is_not_relayed_and_nobody_is_dropped() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    let mut y = server.connect().await;
    server.wait_for_connections(2).await;

    x.send(Message::Text("not-json".into())).await.unwrap();
    x.send(Message::Text(r#"{"unterminated":"#.into())).await.unwrap();

    assert_eq!(recv_text(&mut y, QUIET).await, None);
    assert_eq!(server.state.connection_count().await, 2);

    // the sender is still usable afterwards
    x.send(Message::Text("[1,2]".into())).await.unwrap();
    assert_eq!(recv_text(&mut y, TIMEOUT).await.as_deref(), Some("[1,2]"));
}

#[tokio::test]
async fn broadcast_reaches_every_other_client() {
    let server = boot_server().await;
    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(server.connect().await);
    }
    server.wait_for_connections(4).await;

    clients[0].send(Message::Text("\"hello\"".into())).await.unwrap();

    for peer in clients.iter_mut().skip(1) {
        assert_eq!(recv_text(peer, TIMEOUT).await.as_deref(), Some("\"hello\""));
    }
    assert_eq!(recv_text(&mut clients[0], QUIET).await, None);
}

#[tokio::test]
async fn messages_from_one_sender_arrive_in_order() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    let mut y = server.connect().await;
    server.wait_for_connections(2).await;

    for i in 0..20 {
        x.send(Message::Text(format!(r#"{{"seq":{i}}}"#))).await.unwrap();
    }
    for i in 0..20 {
        assert_eq!(
            recv_text(&mut y, TIMEOUT).await,
            Some(format!(r#"{{"seq":{i}}}"#))
        );
    }
}

#[tokio::test]
async fn disconnect_removes_client_from_registry() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    let mut y = server.connect().await;
    server.wait_for_connections(2).await;

    y.close(None).await.unwrap();
    server.wait_for_connections(1).await;

    x.send(Message::Text("null".into())).await.unwrap();
    assert_eq!(recv_text(&mut x, QUIET).await, None);
}

#[tokio::test]
async fn abrupt_disconnect_is_cleaned_up() {
    let server = boot_server().await;
    let mut x = server.connect().await;
    let y = server.connect().await;
    server.wait_for_connections(2).await;

    drop(y);
    server.wait_for_connections(1).await;

    // server keeps serving the survivor
    let mut z = server.connect().await;
    server.wait_for_connections(2).await;
    x.send(Message::Text("{}".into())).await.unwrap();
    assert_eq!(recv_text(&mut z, TIMEOUT).await.as_deref(), Some("{}"));
}

#[tokio::test]
async fn static_files_share_the_port() {
    let server = boot_server().await;

    let index = http_get(server.addr, "/").await;
    assert!(index.starts_with("http/1.1 200"));
    assert!(index.contains("content-type: text/html"));
    assert!(index.contains("<h1>relay</h1>"));

    let css = http_get(server.addr, "/style.css").await;
    assert!(css.starts_with("http/1.1 200"));
    assert!(css.contains("content-type: text/css"));

    let missing = http_get(server.addr, "/missing.xyz").await;
    assert!(missing.starts_with("http/1.1 404"));
    assert!(missing.contains("not found"));
}

#[tokio::test]
async fn connection_limit_turns_away_extra_clients() {
    let root = tempfile::tempdir().unwrap();
    write_site(root.path());
    let state = AppState::new(
        HubConfig {
            max_connections: Some(1),
        },
        StaticResponder::new(root.path(), "public/index.html"),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_state = state.clone();
    tokio::spawn(async move {
        let _ = serve_with_shutdown(listener, server_state, std::future::pending()).await;
    });

    let (_first, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    wait_for_connections(&state, 1).await;
    let (mut second, _) = connect_async(format!("ws://{addr}/")).await.unwrap();

    // the second socket is closed straight away
    let next = timeout(TIMEOUT, second.next()).await.unwrap();
    assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    assert_eq!(state.connection_count().await, 1);
}

#[tokio::test]
async fn shutdown_closes_open_sockets() {
    let mut server = boot_server().await;
    let mut x = server.connect().await;
    server.wait_for_connections(1).await;

    server.shutdown.take().unwrap().send(()).unwrap();

    let next = timeout(TIMEOUT, x.next()).await.unwrap();
    assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    assert_eq!(server.state.connection_count().await, 0);

    timeout(TIMEOUT, server.handle).await.unwrap().unwrap();
}
