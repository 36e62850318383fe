//! End-to-end tests over loopback TCP.
//!
//! Each test starts its own server on an ephemeral port and drives it
//! with raw line-based clients.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use roomchat::{run, serve, AppError, ServerConfig};

const WAIT: Duration = Duration::from_secs(5);
const HINT: &str = "> there are no rooms yet, /join ROOM_NAME will create one";

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), AppError>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig {
            listen_addr: addr,
            ..config
        };
        let (stop, stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve(listener, config, async move {
            let _ = stopped.await;
        }));

        Self { addr, stop, handle }
    }

    async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        TestClient {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn shutdown(self) {
        self.stop.send(()).unwrap();
        timeout(WAIT, self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed")
    }

    /// Next line that is not `skip`
    async fn recv_skipping(&mut self, skip: &str) -> String {
        loop {
            let line = self.recv().await;
            if line != skip {
                return line;
            }
        }
    }

    async fn expect_closed(&mut self) {
        let next = timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for close");
        assert!(matches!(next, Ok(None) | Err(_)), "unexpected line: {:?}", next);
    }

    async fn join(&mut self, room: &str) {
        self.send(&format!("/join {}", room)).await;
        assert_eq!(self.recv().await, format!("> welcome to {}", room));
    }

    async fn nick(&mut self, nick: &str) {
        self.send(&format!("/nick {}", nick)).await;
        assert_eq!(self.recv().await, format!("> nickname changed to {}", nick));
    }

    /// Issue `/rooms` and collect `count` reply lines, sorted
    async fn rooms(&mut self, count: usize) -> Vec<String> {
        self.send("/rooms").await;
        let mut rows = Vec::with_capacity(count);
        for _ in 0..count {
            rows.push(self.recv().await);
        }
        rows.sort();
        rows
    }
}

#[tokio::test]
async fn test_join_then_join_moves_client() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    let mut carol = server.connect().await;

    alice.nick("alice").await;
    alice.join("a").await;
    bob.join("a").await;
    assert_eq!(alice.recv().await, "anon joined the room");
    carol.join("b").await;

    alice.join("b").await;

    assert_eq!(bob.recv().await, "alice has left the room");
    assert_eq!(carol.recv().await, "alice joined the room");
    assert_eq!(
        alice.rooms(2).await,
        vec!["> a | 1 member", "> b | 2 members"]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_msg_reaches_own_room_only() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    let mut carol = server.connect().await;

    alice.nick("alice").await;
    alice.join("a").await;
    bob.join("a").await;
    assert_eq!(alice.recv().await, "anon joined the room");
    carol.join("b").await;

    alice.send("/msg hello world").await;
    assert_eq!(bob.recv().await, "alice: hello world");

    // The broadcast was processed before these, so any leak would show first
    carol.send("/rooms").await;
    let mut rows = vec![carol.recv().await, carol.recv().await];
    rows.sort();
    assert_eq!(rows, vec!["> a | 2 members", "> b | 1 member"]);

    alice.send("/rooms").await;
    let mut rows = vec![alice.recv().await, alice.recv().await];
    rows.sort();
    assert_eq!(rows, vec!["> a | 2 members", "> b | 1 member"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_rooms_listing() {
    let server = TestServer::start().await;
    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(server.connect().await);
    }

    clients[0].send("/rooms").await;
    assert_eq!(clients[0].recv().await, HINT);
    clients[0].send("/rooms").await;
    assert_eq!(clients[0].recv().await, HINT);

    clients[0].join("solo").await;
    for client in clients.iter_mut().skip(1) {
        client.join("crowd").await;
    }

    assert_eq!(
        clients[0].rooms(2).await,
        vec!["> crowd | 3 members", "> solo | 1 member"]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_room_is_removed() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;

    alice.join("first").await;
    alice.join("second").await;

    assert_eq!(alice.rooms(1).await, vec!["> second | 1 member"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_command_single_notice() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;

    alice.send("/foo bar").await;
    assert_eq!(alice.recv().await, "> unknown command: /foo");

    // Nothing else was queued and no room appeared
    alice.send("/rooms").await;
    assert_eq!(alice.recv().await, HINT);

    server.shutdown().await;
}

#[tokio::test]
async fn test_usage_errors() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;

    alice.send("/msg hi").await;
    assert_eq!(alice.recv().await, "> you need to join a room first, try /rooms");

    alice.send("/join").await;
    assert_eq!(
        alice.recv().await,
        "> room name is required. usage: /join ROOM_NAME"
    );

    alice.join("a").await;
    alice.send("/msg").await;
    assert_eq!(alice.recv().await, "> message is required. usage: /msg MESSAGE");

    alice.send("/nick").await;
    assert_eq!(alice.recv().await, "> bad command. usage: /nick NAME");

    server.shutdown().await;
}

#[tokio::test]
async fn test_nick_without_room() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;

    alice.nick("alice").await;

    bob.join("a").await;
    alice.join("a").await;
    assert_eq!(bob.recv().await, "alice joined the room");

    server.shutdown().await;
}

#[tokio::test]
async fn test_crlf_and_blank_lines() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;

    alice.writer.write_all(b"\r\n   \r\n/join crlf\r\n").await.unwrap();
    assert_eq!(alice.recv().await, "> welcome to crlf");

    server.shutdown().await;
}

#[tokio::test]
async fn test_quit_notifies_and_closes() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;

    alice.join("a").await;
    bob.join("a").await;
    assert_eq!(alice.recv().await, "anon joined the room");

    alice.send("/quit").await;
    assert_eq!(alice.recv().await, "> see you soon!");
    alice.expect_closed().await;

    assert_eq!(bob.recv().await, "anon has left the room");
    assert_eq!(bob.rooms(1).await, vec!["> a | 1 member"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_dropped_connection_leaves_room() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;

    alice.join("a").await;
    bob.join("a").await;
    assert_eq!(alice.recv().await, "anon joined the room");

    drop(alice);

    assert_eq!(bob.recv().await, "anon has left the room");
    assert_eq!(bob.rooms(1).await, vec!["> a | 1 member"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_joins_share_one_room() {
    const CLIENTS: usize = 20;

    let server = TestServer::start().await;
    let mut clients = Vec::new();
    for _ in 0..CLIENTS {
        clients.push(server.connect().await);
    }

    let joins = clients.into_iter().map(|mut client| {
        tokio::spawn(async move {
            client.join("sameroom").await;
            client
        })
    });
    let mut clients: Vec<TestClient> = join_all(joins)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let observer = &mut clients[0];
    observer.send("/rooms").await;
    assert_eq!(
        observer.recv_skipping("anon joined the room").await,
        format!("> sameroom | {} members", CLIENTS)
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_disconnects_clients() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    alice.join("a").await;

    server.shutdown().await;

    assert_eq!(alice.recv().await, "> server is shutting down");
    alice.expect_closed().await;
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let config = ServerConfig {
        listen_addr: addr,
        ..ServerConfig::default()
    };
    let result = run(config).await;

    assert!(matches!(result, Err(AppError::Bind { addr: failed, .. }) if failed == addr));
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced_not_fatal() {
    let server = TestServer::start().await;
    let mut alice = server.connect().await;

    alice.send_raw(b"/join caf\xe9\n").await;
    assert_eq!(alice.recv().await, "> welcome to caf\u{FFFD}");

    assert_eq!(alice.rooms(1).await, vec!["> caf\u{FFFD} | 1 member"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_over_long_line_is_discarded() {
    let server = TestServer::start_with(ServerConfig {
        max_line_length: 16,
        ..ServerConfig::default()
    })
    .await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    alice.join("a").await;
    bob.join("a").await;
    assert_eq!(alice.recv().await, "anon joined the room");

    let long = format!("/msg {}", "x".repeat(64));
    bob.send(&long).await;
    bob.send("/msg hi").await;

    // Only the short line reaches the room
    assert_eq!(alice.recv().await, "anon: hi");

    bob.send("/join b").await;
    assert_eq!(bob.recv().await, "> welcome to b");

    server.shutdown().await;
}

#[tokio::test]
async fn test_listing_larger_than_a_burst() {
    const ROOMS: usize = 50;

    let server = TestServer::start().await;
    let mut members = Vec::with_capacity(ROOMS);
    for i in 0..ROOMS {
        let mut client = server.connect().await;
        client.join(&format!("room{}", i)).await;
        members.push(client);
    }
    let mut observer = server.connect().await;

    let rows = observer.rooms(ROOMS).await;

    let mut expected: Vec<String> = (0..ROOMS)
        .map(|i| format!("> room{} | 1 member", i))
        .collect();
    expected.sort();
    assert_eq!(rows, expected);

    server.shutdown().await;
}
