use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crazytie_core::game_registry::GameId;
use crazytie_core::game_trait::{GameEvent, Input, MatchView};
use crazytie_core::player::Player;

use crazytie_host::game_loop::{
    GameRegistry, SessionBroadcast, SessionCommand, SessionConfig, spawn_session,
};

/// A running session plus everything it has broadcast so far.
pub struct TestSession {
    pub cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    pub rx: mpsc::UnboundedReceiver<SessionBroadcast>,
    pub handle: JoinHandle<()>,
    pub seen: Vec<SessionBroadcast>,
}

impl TestSession {
    pub fn spawn(config: SessionConfig) -> Self {
        let registry = GameRegistry::new();
        let (cmd_tx, rx, handle) = spawn_session(&registry, config).expect("game registered");
        Self {
            cmd_tx,
            rx,
            handle,
            seen: Vec::new(),
        }
    }

    pub fn game(id: GameId) -> Self {
        Self::spawn(SessionConfig::new(id))
    }

    pub fn send(&self, cmd: SessionCommand) {
        self.cmd_tx.send(cmd).expect("session alive");
    }

    pub fn tap(&self, player: Player) {
        self.send(SessionCommand::Input(Input::PlayerActed(player)));
    }

    /// Let the session loop run, then collect what it broadcast.
    pub async fn settle(&mut self) {
        tokio::time::sleep(Duration::from_millis(1)).await;
        while let Ok(msg) = self.rx.try_recv() {
            self.seen.push(msg);
        }
    }

    /// Sleep on the (paused) clock, collecting broadcasts on the way.
    pub async fn wait(&mut self, d: Duration) {
        tokio::time::sleep(d).await;
        while let Ok(msg) = self.rx.try_recv() {
            self.seen.push(msg);
        }
    }

    pub fn latest_view(&self) -> MatchView {
        self.seen
            .iter()
            .rev()
            .find_map(|m| match m {
                SessionBroadcast::View(v) => Some(v.clone()),
                _ => None,
            })
            .expect("at least one view broadcast")
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.seen
            .iter()
            .filter_map(|m| match m {
                SessionBroadcast::Events(e) => Some(e.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Stop the session and report whether `Ended` was broadcast.
    pub async fn stop(mut self) -> bool {
        let _ = self.cmd_tx.send(SessionCommand::Stop);
        let ended = wait_for_end(&mut self.rx).await;
        let _ = self.handle.await;
        ended
    }
}

pub async fn wait_for_end(rx: &mut mpsc::UnboundedReceiver<SessionBroadcast>) -> bool {
    loop {
        match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
            Ok(Some(SessionBroadcast::Ended)) => return true,
            Ok(Some(_)) => continue,
            _ => return false,
        }
    }
}
