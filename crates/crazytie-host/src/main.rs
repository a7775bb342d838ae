use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crazytie_host::config::HostConfig;
use crazytie_host::error::HostError;
use crazytie_host::game_loop::{GameRegistry, SessionBroadcast, SessionCommand, spawn_session};
use crazytie_host::session_config;
use crazytie_host::terminal::{LineAction, OutputLine, parse_line};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "Exiting");
        eprintln!("crazytie: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), HostError> {
    let config = HostConfig::load();
    init_tracing(config.json_logs);
    config.validate()?;

    let game = std::env::args().nth(1);
    let session = session_config(&config, game.as_deref())?;
    let game_id = session.game_id;

    let registry = GameRegistry::new();
    let (cmd_tx, mut broadcast_rx, handle) =
        spawn_session(&registry, session).ok_or(HostError::NotRegistered(game_id))?;
    tracing::info!(game = %game_id, "Crazy Tie host started");

    let printer = tokio::spawn(async move {
        while let Some(msg) = broadcast_rx.recv().await {
            match msg {
                SessionBroadcast::View(view) => println!("{}", OutputLine::View(&view).to_json()),
                SessionBroadcast::Events(events) => {
                    for event in &events {
                        println!("{}", OutputLine::Event(event).to_json());
                    }
                },
                SessionBroadcast::EncodedState(bytes) => {
                    println!("{}", OutputLine::State { bytes: bytes.len() }.to_json());
                },
                SessionBroadcast::Ended => {
                    println!("{}", OutputLine::Ended.to_json());
                    break;
                },
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, &config.keys) {
            LineAction::Command(cmd) => {
                if cmd_tx.send(cmd).is_err() {
                    break;
                }
            },
            LineAction::Quit => break,
            LineAction::Ignore => tracing::debug!(line = %line.trim(), "Unrecognised input"),
        }
    }

    let _ = cmd_tx.send(SessionCommand::Stop);
    let _ = handle.await;
    let _ = printer.await;
    Ok(())
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
