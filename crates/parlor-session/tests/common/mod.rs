use std::time::Duration;

use parlor_session::{
    AuthorityRole, SessionConfig, SessionDriver, SessionHandle, SessionReport, link,
    start_with_link,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub type SessionParts = (
    SessionDriver,
    SessionHandle,
    oneshot::Receiver<SessionReport>,
);

pub fn quick_config() -> SessionConfig {
    SessionConfig {
        accept_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
        handshake_timeout: Duration::from_secs(2),
        tick_interval: Duration::from_millis(5),
    }
}

/// Bring up a fully handshaken host+client pair over localhost.
pub async fn session_pair(config: &SessionConfig) -> (SessionParts, SessionParts) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let host_config = config.clone();
    let host_task = tokio::spawn(async move {
        let (link, events) = link::host_with_listener(listener, &host_config)
            .await
            .unwrap();
        start_with_link(AuthorityRole::Host, link, events, "alice", host_config)
            .await
            .unwrap()
    });

    let (link, events) = link::join(addr, config).await.unwrap();
    let client = start_with_link(AuthorityRole::Client, link, events, "bob", config.clone())
        .await
        .unwrap();

    let host = host_task.await.unwrap();
    (host, client)
}

/// Poll until `predicate` holds on the handle or the deadline passes.
pub async fn wait_until<F>(what: &str, deadline: Duration, mut predicate: F)
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}
