//! Every public operation over real HTTP against the mock Thunder server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread with its
//! own tokio runtime, seeds a few connected users, then drives the blocking
//! `ThunderClient` (with its default ureq transport) from the test thread.

use std::time::Duration;

use serde_json::json;
use thunder_client::{ClientConfig, ThunderClient};
use thunder_mock_server::MockState;

const KEY: &str = "apikey";
const SECRET: &str = "apisecret";

/// Bind a listener, seed the registry and serve in the background.
fn start_server(state: MockState) -> u16 {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = std_listener.local_addr().unwrap().port();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            state.connect("alice", ["lobby", "news"]).await;
            state.connect("bob", ["lobby"]).await;
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            thunder_mock_server::run(listener, state).await
        })
        .unwrap();
    });

    port
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn config(port: u16) -> ClientConfig {
    ClientConfig::new(KEY, SECRET, "127.0.0.1")
        .with_port(port)
        .with_transport_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
        .with_connect_timeout(Duration::from_secs(5))
}

/// The listener is bound before the thread starts, so the first request only
/// has to wait for the registry to be seeded.
fn wait_until_seeded(client: &ThunderClient) {
    for _ in 0..100 {
        if client.get_user_count().unwrap() == Some(2) {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("mock server never became ready");
}

#[test]
fn thunder_lifecycle() {
    let state = MockState::new(KEY, SECRET);
    let port = start_server(state.clone());
    let client = ThunderClient::new(config(port));

    // Step 1: two users connected.
    wait_until_seeded(&client);
    assert_eq!(client.get_user_count().unwrap(), Some(2));

    // Step 2: channel membership.
    assert_eq!(
        client.get_users_in_channel("lobby").unwrap(),
        Some(vec!["alice".to_string(), "bob".to_string()])
    );
    assert_eq!(client.get_users_in_channel("news").unwrap(), Some(vec!["alice".to_string()]));

    // Step 3: presence.
    assert_eq!(client.is_user_online("alice").unwrap(), Some(true));
    assert_eq!(client.is_user_online("mallory").unwrap(), Some(false));

    // Step 4: direct message reaches exactly one user, verbatim.
    let message = json!({"event": "greeting", "data": {"text": "hi", "tags": [1, 2]}});
    assert_eq!(client.send_message_to_user("alice", &message).unwrap(), Some(1));
    assert_eq!(block_on(state.inbox("alice")), vec![message.clone()]);

    // Step 5: offline user gets nothing.
    assert_eq!(client.send_message_to_user("mallory", &message).unwrap(), Some(0));

    // Step 6: channel broadcast.
    assert_eq!(client.send_message_to_channel("lobby", "broadcast").unwrap(), Some(2));
    assert_eq!(block_on(state.inbox("bob")), vec![json!("broadcast")]);

    // Step 7: disconnect, then disconnect again.
    assert_eq!(client.disconnect_user("bob").unwrap(), Some(true));
    assert_eq!(client.disconnect_user("bob").unwrap(), None);

    // Step 8: state reflects the disconnect.
    assert_eq!(client.get_user_count().unwrap(), Some(1));
    assert_eq!(client.is_user_online("bob").unwrap(), Some(false));
    assert_eq!(client.get_users_in_channel("lobby").unwrap(), Some(vec!["alice".to_string()]));
}

#[test]
fn wrong_secret_resolves_to_none() {
    let port = start_server(MockState::new(KEY, SECRET));
    let good = ThunderClient::new(config(port));
    wait_until_seeded(&good);

    let client = ThunderClient::new(ClientConfig { api_secret: "wrong".to_string(), ..config(port) });
    assert_eq!(client.get_user_count().unwrap(), None);
    assert_eq!(client.send_message_to_user("alice", &json!({})).unwrap(), None);
    assert_eq!(client.disconnect_user("alice").unwrap(), None);
    assert_eq!(good.is_user_online("alice").unwrap(), Some(true));
}

#[test]
fn unreachable_server_resolves_to_none() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = ThunderClient::new(
        config(port)
            .with_request_timeout(Duration::from_millis(500))
            .with_connect_timeout(Duration::from_millis(500)),
    );

    assert_eq!(client.get_user_count().unwrap(), None);
    assert_eq!(client.send_message_to_channel("lobby", "hello").unwrap(), None);
    assert_eq!(client.is_user_online("alice").unwrap(), None);
    assert_eq!(client.disconnect_user("alice").unwrap(), None);
}
