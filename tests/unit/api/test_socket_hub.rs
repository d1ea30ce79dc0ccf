// Unit tests for the WebSocket broadcast hub

use lifusic_account::api::socket::SocketHub;

#[tokio::test]
async fn test_broadcast_reaches_every_client() {
    let hub = SocketHub::new();
    let (_a, mut rx_a) = hub.register().await;
    let (_b, mut rx_b) = hub.register().await;

    let delivered = hub.broadcast("hello!!").await;

    assert_eq!(delivered, 2);
    assert_eq!(rx_a.recv().await, Some("hello!!".to_string()));
    assert_eq!(rx_b.recv().await, Some("hello!!".to_string()));
}

#[tokio::test]
async fn test_broadcast_drops_closed_clients() {
    let hub = SocketHub::new();
    let (_open, mut rx_open) = hub.register().await;
    let (_closed, rx_closed) = hub.register().await;
    drop(rx_closed);

    let delivered = hub.broadcast("ping").await;

    assert_eq!(delivered, 1);
    assert_eq!(hub.client_count().await, 1);
    assert_eq!(rx_open.recv().await, Some("ping".to_string()));
}

#[tokio::test]
async fn test_unregistered_client_receives_nothing() {
    let hub = SocketHub::new();
    let (id, mut rx) = hub.register().await;
    hub.unregister(&id).await;

    assert_eq!(hub.broadcast("late").await, 0);
    // Sender side was dropped with the registration
    assert_eq!(rx.recv().await, None);
}
