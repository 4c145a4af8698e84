//! Integration tests for the relay hub: real TCP connections, framed
//! events, fan-out and peer-count behavior.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use ol_core::config::HubConfig;
use ol_hub::{HubServer, PeerRegistry};
use ol_protocol::{EventCodec, Order, OrderId, OrderLineItem, SyncEvent};

type Client = Framed<TcpStream, EventCodec>;

async fn start_hub() -> (std::net::SocketAddr, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();

    let server = HubServer::new(
        HubConfig::default(),
        Arc::new(PeerRegistry::new()),
        cancel.clone(),
    );
    tokio::spawn(async move {
        server.serve(listener).await.unwrap();
    });

    (addr, cancel)
}

async fn connect(addr: std::net::SocketAddr) -> Client {
    let socket = TcpStream::connect(addr).await.unwrap();
    Framed::new(socket, EventCodec::new())
}

async fn next_event(client: &mut Client) -> SyncEvent {
    tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for event")
        .expect("connection closed")
        .expect("protocol error")
}

fn sample_order(id: u64) -> Order {
    Order::new(
        OrderId::new(id),
        vec![OrderLineItem::new("yakisoba", "Yakisoba", 2, 140)],
        1_700_000_000_000,
    )
}

#[tokio::test]
async fn test_event_fans_out_to_other_terminals_only() {
    let (addr, _cancel) = start_hub().await;

    let mut a = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(1));

    let mut b = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(2));
    assert_eq!(next_event(&mut b).await, SyncEvent::PeerCount(2));

    let order = sample_order(1);
    a.send(SyncEvent::NewOrder(order.clone())).await.unwrap();

    // B receives the event verbatim
    assert_eq!(next_event(&mut b).await, SyncEvent::NewOrder(order));

    // A receives nothing back; prove it by sending a second event through
    // B and checking it is the next thing A sees.
    b.send(SyncEvent::CancelOrder(OrderId::new(1))).await.unwrap();
    assert_eq!(
        next_event(&mut a).await,
        SyncEvent::CancelOrder(OrderId::new(1))
    );
}

#[tokio::test]
async fn test_peer_count_on_disconnect() {
    let (addr, _cancel) = start_hub().await;

    let mut a = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(1));

    let mut b = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(2));
    assert_eq!(next_event(&mut b).await, SyncEvent::PeerCount(2));

    drop(b);
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(1));
}

#[tokio::test]
async fn test_per_sender_order_preserved() {
    let (addr, _cancel) = start_hub().await;

    let mut a = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(1));
    let mut b = connect(addr).await;
    assert_eq!(next_event(&mut a).await, SyncEvent::PeerCount(2));
    assert_eq!(next_event(&mut b).await, SyncEvent::PeerCount(2));

    for id in 1..=10u64 {
        a.send(SyncEvent::NewOrder(sample_order(id))).await.unwrap();
    }

    for id in 1..=10u64 {
        match next_event(&mut b).await {
            SyncEvent::NewOrder(order) => assert_eq!(order.id, OrderId::new(id)),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_three_terminals_all_replicas_receive() {
    let (addr, _cancel) = start_hub().await;

    let mut register = connect(addr).await;
    assert_eq!(next_event(&mut register).await, SyncEvent::PeerCount(1));
    let mut kitchen = connect(addr).await;
    assert_eq!(next_event(&mut register).await, SyncEvent::PeerCount(2));
    assert_eq!(next_event(&mut kitchen).await, SyncEvent::PeerCount(2));
    let mut display = connect(addr).await;
    assert_eq!(next_event(&mut register).await, SyncEvent::PeerCount(3));
    assert_eq!(next_event(&mut kitchen).await, SyncEvent::PeerCount(3));
    assert_eq!(next_event(&mut display).await, SyncEvent::PeerCount(3));

    let order = sample_order(7);
    register
        .send(SyncEvent::NewOrder(order.clone()))
        .await
        .unwrap();

    assert_eq!(next_event(&mut kitchen).await, SyncEvent::NewOrder(order.clone()));
    assert_eq!(next_event(&mut display).await, SyncEvent::NewOrder(order));
}
