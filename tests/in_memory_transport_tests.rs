use std::time::Duration;

use minesweeper_duel::transport::in_memory::{transport_pair, MemoryProvider};
use minesweeper_duel::transport::Transport;
use minesweeper_duel::{
    ConnectionState, GameConfig, GameSession, Message, Role, TransportEvent, TransportSession,
};
use tokio::time::timeout;

async fn next_event(session: &mut TransportSession) -> Option<TransportEvent> {
    timeout(Duration::from_secs(5), session.recv())
        .await
        .expect("timed out waiting for a transport event")
}

async fn connected_sessions() -> (TransportSession, TransportSession) {
    let (host_provider, guest_provider) = MemoryProvider::pair();
    let mut host = TransportSession::new();
    let mut guest = TransportSession::new();
    host.listen(host_provider).unwrap();
    assert_eq!(host.state(), ConnectionState::Listening);
    guest.dial(guest_provider, "in-memory").unwrap();

    assert_eq!(next_event(&mut host).await, Some(TransportEvent::Connected(Role::Host)));
    assert_eq!(next_event(&mut guest).await, Some(TransportEvent::Connected(Role::Guest)));
    (host, guest)
}

#[tokio::test(flavor = "multi_thread")]
async fn framed_pair_carries_messages_both_ways() -> anyhow::Result<()> {
    let (mut a, mut b) = transport_pair();

    a.send(&Message::BoardSync(vec![(0, 0), (0, 1), (9, 9)])).await?;
    a.send(&Message::ResetGame).await?;
    assert_eq!(b.recv().await?, Some(Message::BoardSync(vec![(0, 0), (0, 1), (9, 9)])));
    assert_eq!(b.recv().await?, Some(Message::ResetGame));

    b.send(&Message::BoardSyncAck).await?;
    assert_eq!(a.recv().await?, Some(Message::BoardSyncAck));

    a.close().await?;
    assert_eq!(b.recv().await?, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sessions_connect_and_exchange_full_state() -> anyhow::Result<()> {
    let (mut host, mut guest) = connected_sessions().await;
    assert_eq!(host.state(), ConnectionState::Connected);
    assert_eq!(guest.state(), ConnectionState::Connected);
    assert_eq!(host.role(), Some(Role::Host));
    assert_eq!(guest.role(), Some(Role::Guest));

    let mut game = GameSession::new(GameConfig::default(), "Ada", "Bob").unwrap();
    game.install_mines(&[(0, 0), (0, 1), (9, 9)]).unwrap();
    game.toggle_flag(0, 0);
    game.reveal(5, 5);
    let update = Message::GameStateUpdate(game.state());

    host.send(update.clone()).await?;
    assert_eq!(next_event(&mut guest).await, Some(TransportEvent::Message(update)));

    guest.send(Message::ResetGame).await?;
    assert_eq!(
        next_event(&mut host).await,
        Some(TransportEvent::Message(Message::ResetGame))
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn messages_arrive_in_order() -> anyhow::Result<()> {
    let (mut host, mut guest) = connected_sessions().await;
    let sent: Vec<Message> = (0..20)
        .map(|i| Message::BoardSync(vec![(i, i)]))
        .collect();
    for msg in &sent {
        host.send(msg.clone()).await?;
    }
    for msg in sent {
        assert_eq!(next_event(&mut guest).await, Some(TransportEvent::Message(msg)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_one_side_notifies_the_other() {
    let (mut host, mut guest) = connected_sessions().await;
    guest.disconnect();
    assert_eq!(guest.state(), ConnectionState::Disconnected);

    assert_eq!(next_event(&mut host).await, Some(TransportEvent::Disconnected(None)));
    assert_eq!(next_event(&mut host).await, None);
    assert_eq!(host.state(), ConnectionState::Disconnected);
    assert!(host.send(Message::ResetGame).await.is_err());
}
