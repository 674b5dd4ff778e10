//! Mid-session link loss: the survivor's receiver loop exits and the
//! session reaches `Terminated` without an unhandled error.

mod common;

use std::time::Duration;

use common::{quick_config, session_pair, wait_until};
use parlor_session::{GameVariant, SessionPhase};

#[tokio::test]
async fn peer_exit_terminates_both_sessions() {
    let config = quick_config();
    let ((host_driver, host, host_report), (client_driver, client, client_report)) =
        session_pair(&config).await;

    host.select_game(GameVariant::Pong);
    tokio::spawn(host_driver.run());
    tokio::spawn(client_driver.run());

    wait_until("both sides in session", Duration::from_secs(5), || {
        host.phase() == SessionPhase::InSession && client.phase() == SessionPhase::InSession
    })
    .await;

    // The host walks away; its link teardown is the client's only signal.
    host.exit();

    wait_until("host terminated", Duration::from_secs(2), || {
        host.phase() == SessionPhase::Terminated
    })
    .await;
    wait_until("client terminated", Duration::from_secs(2), || {
        client.phase() == SessionPhase::Terminated
    })
    .await;

    // Both sides still produce a report for the stats layer.
    let host_report = host_report.await.unwrap();
    let client_report = client_report.await.unwrap();
    assert_eq!(host_report.variant, GameVariant::Pong);
    assert_eq!(client_report.variant, GameVariant::Pong);
}

#[tokio::test]
async fn teardown_before_any_selection_reports_nothing() {
    let config = quick_config();
    let ((host_driver, host, host_report), (client_driver, client, _client_report)) =
        session_pair(&config).await;

    tokio::spawn(host_driver.run());
    tokio::spawn(client_driver.run());

    host.exit();

    wait_until("both terminated", Duration::from_secs(2), || {
        host.phase() == SessionPhase::Terminated && client.phase() == SessionPhase::Terminated
    })
    .await;

    // No game was ever settled, so there is nothing to report.
    assert!(host_report.await.is_err());
}
