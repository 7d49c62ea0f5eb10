//! Integration tests for WebSocket upgrade forwarding.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error, Message};

mod common;

#[tokio::test]
async fn upgrade_round_trip_relays_messages() {
    let backend = common::start_ws_echo_backend().await;
    let gateway =
        common::start_gateway(common::config_with_tenants(&[("alice", Some(backend.port()))]))
            .await;

    let (mut socket, response) =
        connect_async(format!("ws://{}/alice/st/ws", gateway.addr))
            .await
            .expect("upgrade through the gateway succeeds");
    assert_eq!(response.status().as_u16(), 101);

    socket
        .send(Message::text("hello through the gateway".to_string()))
        .await
        .expect("send succeeds");

    let echoed = loop {
        match socket
            .next()
            .await
            .expect("stream stays open")
            .expect("frame is readable")
        {
            Message::Text(text) => break text,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    };
    assert_eq!(echoed.as_str(), "hello through the gateway");

    let payload = vec![0u8, 159, 146, 150];
    socket
        .send(Message::Binary(payload.clone().into()))
        .await
        .expect("send succeeds");

    let echoed = loop {
        match socket
            .next()
            .await
            .expect("stream stays open")
            .expect("frame is readable")
        {
            Message::Binary(data) => break data,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    };
    assert_eq!(echoed.as_ref(), payload.as_slice());

    socket.close(None).await.expect("close succeeds");
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn upgrade_for_unknown_tenant_never_reaches_101() {
    let gateway = common::start_gateway(common::config_with_tenants(&[])).await;

    let error = connect_async(format!("ws://{}/ghost/st/ws", gateway.addr))
        .await
        .expect_err("handshake must be rejected");

    match error {
        Error::Http(response) => assert_eq!(response.status().as_u16(), 404),
        other => panic!("expected an http-level rejection, got {other:?}"),
    }

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn upgrade_for_unprovisioned_tenant_is_rejected() {
    let gateway = common::start_gateway(common::config_with_tenants(&[("alice", None)])).await;

    let error = connect_async(format!("ws://{}/alice/st/ws", gateway.addr))
        .await
        .expect_err("handshake must be rejected");

    match error {
        Error::Http(response) => assert_eq!(response.status().as_u16(), 503),
        other => panic!("expected an http-level rejection, got {other:?}"),
    }

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn upgrade_with_dead_backend_fails_without_upgrading_client() {
    let dead_port = common::unused_port().await;
    let gateway =
        common::start_gateway(common::config_with_tenants(&[("alice", Some(dead_port))])).await;

    let error = connect_async(format!("ws://{}/alice/st/ws", gateway.addr))
        .await
        .expect_err("handshake must be rejected when the backend is down");

    match error {
        Error::Http(response) => assert_eq!(response.status().as_u16(), 502),
        other => panic!("expected an http-level rejection, got {other:?}"),
    }

    gateway.shutdown.trigger();
}
