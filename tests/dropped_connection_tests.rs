use std::time::Duration;

use minesweeper_duel::transport::in_memory::MemoryProvider;
use minesweeper_duel::transport::tcp::TcpProvider;
use minesweeper_duel::{ConnectionState, Message, Role, TransportEvent, TransportSession};
use tokio::net::TcpStream;
use tokio::time::timeout;

async fn next_event(session: &mut TransportSession) -> Option<TransportEvent> {
    timeout(Duration::from_secs(5), session.recv())
        .await
        .expect("timed out waiting for a transport event")
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let mut session = TransportSession::new();
    session.disconnect();
    session.disconnect();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.role(), None);
    assert_eq!(session.recv().await, None);
}

#[tokio::test]
async fn send_fails_when_not_connected() {
    let mut session = TransportSession::new();
    assert!(session.send(Message::ResetGame).await.is_err());

    let provider = TcpProvider::bind("127.0.0.1:0").await.unwrap();
    session.listen(provider).unwrap();
    assert_eq!(session.state(), ConnectionState::Listening);
    assert!(session.send(Message::BoardSyncAck).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_listen_can_be_cancelled_and_restarted() {
    let mut session = TransportSession::new();
    let provider = TcpProvider::bind("127.0.0.1:0").await.unwrap();
    session.listen(provider).unwrap();

    // A second start while listening is refused.
    let other = TcpProvider::bind("127.0.0.1:0").await.unwrap();
    assert!(session.listen(other).is_err());

    session.disconnect();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.recv().await, None);

    let provider = TcpProvider::bind("127.0.0.1:0").await.unwrap();
    let addr = provider.local_addr().unwrap();
    session.listen(provider).unwrap();
    let _peer = TcpStream::connect(addr).await.unwrap();
    assert_eq!(next_event(&mut session).await, Some(TransportEvent::Connected(Role::Host)));
}

#[tokio::test(flavor = "multi_thread")]
async fn peer_vanishing_mid_game_is_reported() {
    let provider = TcpProvider::bind("127.0.0.1:0").await.unwrap();
    let addr = provider.local_addr().unwrap();
    let mut host = TransportSession::new();
    host.listen(provider).unwrap();

    let peer = TcpStream::connect(addr).await.unwrap();
    assert_eq!(next_event(&mut host).await, Some(TransportEvent::Connected(Role::Host)));
    drop(peer);

    assert!(matches!(
        next_event(&mut host).await,
        Some(TransportEvent::Disconnected(_))
    ));
    assert_eq!(next_event(&mut host).await, None);
    assert_eq!(host.state(), ConnectionState::Disconnected);
    assert!(host.send(Message::ResetGame).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn listener_gone_before_dial() {
    let (host_provider, guest_provider) = MemoryProvider::pair();
    drop(host_provider);

    let mut guest = TransportSession::new();
    guest.dial(guest_provider, "nobody").unwrap();
    assert_eq!(guest.state(), ConnectionState::Connecting);
    assert!(matches!(
        next_event(&mut guest).await,
        Some(TransportEvent::Disconnected(Some(_)))
    ));
    assert_eq!(guest.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_a_session_closes_its_link() {
    let (host_provider, guest_provider) = MemoryProvider::pair();
    let mut host = TransportSession::new();
    let mut guest = TransportSession::new();
    host.listen(host_provider).unwrap();
    guest.dial(guest_provider, "peer").unwrap();
    assert_eq!(next_event(&mut host).await, Some(TransportEvent::Connected(Role::Host)));
    assert_eq!(next_event(&mut guest).await, Some(TransportEvent::Connected(Role::Guest)));

    drop(guest);
    assert_eq!(next_event(&mut host).await, Some(TransportEvent::Disconnected(None)));
}
