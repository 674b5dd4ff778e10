use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use parlor_session::{
    DEFAULT_PORT, GameSnapshot, GameVariant, SessionConfig, SessionPhase, StartMode, start,
};

/// Two-player parlor game sessions over one TCP link
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Host or join a peer-to-peer game session", long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Username announced to the peer
    #[arg(short, long, default_value = "Player")]
    username: String,

    /// Game to pick once the link is up (pong, tictactoe, snake).
    /// Omit to follow the peer's selection.
    #[arg(short, long)]
    game: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Host a session and wait for a peer to join
    Host {
        /// TCP bind port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Join a hosted session
    Join {
        /// Host address
        addr: IpAddr,

        /// Host port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

fn parse_game(name: &str) -> anyhow::Result<GameVariant> {
    match name.to_ascii_lowercase().as_str() {
        "pong" => Ok(GameVariant::Pong),
        "tictactoe" | "tic-tac-toe" => Ok(GameVariant::TicTacToe),
        "snake" => Ok(GameVariant::Snake),
        other => anyhow::bail!("unknown game '{other}' (pong, tictactoe, snake)"),
    }
}

fn log_snapshot(snapshot: &GameSnapshot) {
    match snapshot {
        GameSnapshot::Pong(s) => info!(
            score = %format!("{}:{}", s.own_score, s.opponent_score),
            ball = ?s.ball,
            "pong"
        ),
        GameSnapshot::TicTacToe(s) => info!(
            turn = s.current_player,
            winner = s.winner,
            board = ?s.board,
            "tic-tac-toe"
        ),
        GameSnapshot::Snake(s) => info!(
            score = %format!("{}:{}", s.own_score, s.opponent_score),
            own_len = s.own_snake.len(),
            opponent_len = s.opponent_snake.len(),
            game_over = s.game_over,
            "snake"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let game = args.game.as_deref().map(parse_game).transpose()?;

    let mode = match args.mode {
        Mode::Host { port } => StartMode::Host { port },
        Mode::Join { addr, port } => StartMode::Join {
            addr: SocketAddr::new(addr, port),
        },
    };

    let (driver, handle, report_rx) = start(mode, &args.username, SessionConfig::default()).await?;
    info!(peer = handle.peer_name(), "session established");

    match game {
        Some(variant) => handle.select_game(variant),
        None => info!("waiting for the peer to pick a game"),
    }

    let driver_task = tokio::spawn(driver.run());

    let mut status = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                handle.exit();
                break;
            }
            _ = status.tick() => {
                if handle.phase() == SessionPhase::Terminated {
                    break;
                }
                if let Some(snapshot) = handle.snapshot() {
                    log_snapshot(&snapshot);
                }
            }
        }
    }

    let _ = driver_task.await;
    match report_rx.await {
        Ok(report) => info!(
            variant = %report.variant,
            result = ?report.result,
            "session report"
        ),
        Err(_) => info!("session ended before a game was played"),
    }

    Ok(())
}
