//! Symmetric turn-based play: both sides apply the identical move
//! sequence and reach the identical verdict.

mod common;

use std::time::Duration;

use common::{quick_config, session_pair, wait_until};
use parlor_session::{
    GameResult, GameSnapshot, GameVariant, PlayerInput, SessionPhase,
    games::tictactoe::{BoardSnapshot, X_PIECE},
};

fn board(handle: &parlor_session::SessionHandle) -> Option<BoardSnapshot> {
    match handle.snapshot() {
        Some(GameSnapshot::TicTacToe(s)) => Some(s),
        _ => None,
    }
}

#[tokio::test]
async fn identical_move_sequences_converge_to_the_same_verdict() {
    let config = quick_config();
    let ((host_driver, host, host_report), (client_driver, client, client_report)) =
        session_pair(&config).await;

    // Only the host picks; the peer's selection settles the client side.
    host.select_game(GameVariant::TicTacToe);
    tokio::spawn(host_driver.run());
    tokio::spawn(client_driver.run());

    wait_until("both sides in session", Duration::from_secs(5), || {
        host.phase() == SessionPhase::InSession && client.phase() == SessionPhase::InSession
    })
    .await;

    // X(0,0) O(1,0) X(0,1) O(1,1) X(0,2): X takes the top row.
    let script: [(&parlor_session::SessionHandle, u8, u8); 5] = [
        (&host, 0, 0),
        (&client, 1, 0),
        (&host, 0, 1),
        (&client, 1, 1),
        (&host, 0, 2),
    ];

    for (mover, row, col) in script {
        mover.submit_input(PlayerInput::CellClick { row, col });
        // Each move must land on both boards before the next one is legal.
        wait_until("move visible on both boards", Duration::from_secs(5), || {
            let placed = |handle| board(handle).is_some_and(|b| {
                b.board[row as usize][col as usize] != 0
            });
            placed(&host) && placed(&client)
        })
        .await;
    }

    let host_board = board(&host).unwrap();
    let client_board = board(&client).unwrap();
    assert_eq!(host_board.board, client_board.board);
    assert_eq!(host_board.winner, X_PIECE);
    assert_eq!(client_board.winner, X_PIECE);
    assert!(host_board.game_over && client_board.game_over);

    // Tearing down after the verdict reports win/loss to the stats layer.
    host.exit();
    let host_report = host_report.await.unwrap();
    let client_report = client_report.await.unwrap();
    assert_eq!(host_report.variant, GameVariant::TicTacToe);
    assert_eq!(host_report.result, GameResult::Win);
    assert_eq!(client_report.result, GameResult::Loss);
}

#[tokio::test]
async fn moving_out_of_turn_changes_nothing() {
    let config = quick_config();
    let ((host_driver, host, _r1), (client_driver, client, _r2)) = session_pair(&config).await;

    host.select_game(GameVariant::TicTacToe);
    tokio::spawn(host_driver.run());
    tokio::spawn(client_driver.run());

    wait_until("both sides in session", Duration::from_secs(5), || {
        host.phase() == SessionPhase::InSession && client.phase() == SessionPhase::InSession
    })
    .await;

    // O tries to open; X has the first turn, so nothing may change anywhere.
    client.submit_input(PlayerInput::CellClick { row: 2, col: 2 });
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(board(&host).unwrap().board, [[0; 3]; 3]);
    assert_eq!(board(&client).unwrap().board, [[0; 3]; 3]);
}
