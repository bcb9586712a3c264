//! End-to-end tests over a real listener on an ephemeral port

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::Framed;

use tcpchat::{message, serve, FrameCodec, ServerConfig};

type Client = Framed<TcpStream, FrameCodec>;

async fn start_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve(listener, ServerConfig::default()).await;
    });
    addr
}

async fn connect_and_join(addr: SocketAddr, name: &str) -> Client {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut client = Framed::new(stream, FrameCodec);
    client
        .send(message::join_announcement(name))
        .await
        .unwrap();
    client
}

/// Next non-empty frame (terminator frames are skipped)
async fn next_line(client: &mut Client) -> String {
    loop {
        let frame = timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("frame decode failed");
        if !frame.is_empty() {
            return frame;
        }
    }
}

#[tokio::test]
async fn end_to_end_chat_listing_and_leave() {
    let addr = start_relay().await;

    let mut alice = connect_and_join(addr, "alice").await;
    let mut bob = connect_and_join(addr, "bob").await;

    let notice = next_line(&mut alice).await;
    assert!(notice.contains("bob has joined the chat."));

    // alice chats; the fan-out reaches everyone, alice included
    let hi = message::chat_line("alice", "hi");
    alice.send(hi.clone()).await.unwrap();
    assert_eq!(next_line(&mut bob).await, hi);
    assert_eq!(next_line(&mut alice).await, hi);

    // bob asks for the roster privately
    bob.send(message::chat_line("bob", "allusers")).await.unwrap();
    let mut listing = vec![next_line(&mut bob).await, next_line(&mut bob).await];
    listing.sort();
    assert!(listing[0].ends_with(".) alice") || listing[0].ends_with(".) bob"));
    assert!(listing.iter().any(|l| l.ends_with(".) alice")));
    assert!(listing.iter().any(|l| l.ends_with(".) bob")));

    // bob asks for help privately
    bob.send(message::chat_line("bob", "help")).await.unwrap();
    let menu = next_line(&mut bob).await;
    assert!(menu.contains("bye- disconnect client from chat"));

    // bob leaves; both see the leave notice
    bob.send(message::chat_line("bob", "bye")).await.unwrap();
    assert!(next_line(&mut alice).await.contains("bob has left the chat."));
    assert!(next_line(&mut bob).await.contains("bob has left the chat."));

    // only alice remains registered
    alice
        .send(message::chat_line("alice", "allusers"))
        .await
        .unwrap();
    assert_eq!(&next_line(&mut alice).await, "1.) alice");
}

#[tokio::test]
async fn join_notices_exclude_the_joiner() {
    let addr = start_relay().await;

    let mut alice = connect_and_join(addr, "alice").await;
    let mut bob = connect_and_join(addr, "bob").await;
    assert!(next_line(&mut alice).await.contains("bob has joined"));

    let mut carol = connect_and_join(addr, "carol").await;
    assert!(next_line(&mut alice).await.contains("carol has joined"));
    assert!(next_line(&mut bob).await.contains("carol has joined"));

    // carol saw no join notice at all; her first delivery is a chat
    let ping = message::chat_line("alice", "ping");
    alice.send(ping.clone()).await.unwrap();
    assert_eq!(next_line(&mut carol).await, ping);
}

#[tokio::test]
async fn malformed_lines_are_inert() {
    let addr = start_relay().await;

    let mut alice = connect_and_join(addr, "alice").await;
    let mut bob = connect_and_join(addr, "bob").await;
    next_line(&mut alice).await; // bob's join notice

    // no identity delimiter: dropped silently, no broadcast, no reply
    bob.send("garbage without a delimiter".to_string())
        .await
        .unwrap();

    let ping = message::chat_line("bob", "ping");
    bob.send(ping.clone()).await.unwrap();
    assert_eq!(next_line(&mut alice).await, ping);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let addr = start_relay().await;

    let mut alice = connect_and_join(addr, "alice").await;
    let mut imposter = connect_and_join(addr, "alice").await;

    let rejection = next_line(&mut imposter).await;
    assert!(rejection.contains("already taken"));

    // the server closes the rejected connection
    let eof = timeout(Duration::from_secs(2), imposter.next())
        .await
        .expect("timed out waiting for close");
    assert!(matches!(eof, None));

    // the original session keeps working
    let ping = message::chat_line("alice", "ping");
    alice.send(ping.clone()).await.unwrap();
    assert_eq!(next_line(&mut alice).await, ping);
}

#[tokio::test]
async fn abrupt_disconnect_broadcasts_leave_notice() {
    let addr = start_relay().await;

    let mut alice = connect_and_join(addr, "alice").await;
    let bob = connect_and_join(addr, "bob").await;
    next_line(&mut alice).await; // bob's join notice

    // bob drops the connection without a leave command
    drop(bob);

    assert!(next_line(&mut alice).await.contains("bob has left the chat."));
}
