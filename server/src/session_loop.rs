use crate::config::ServerConfig;
use crate::player::{ConnectionId, Movement};
use crate::protocol::{CollectedMsg, JoinedMsg, LeftMsg, PlayerWire, PlayersMsg, ServerMsg};
use crate::state::SessionRegistry;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Per-connection queue of outbound messages. Unbounded: a slow client
/// accumulates sends instead of losing them.
pub type Outbox = mpsc::UnboundedSender<ServerMsg>;

/// Commands from client connections to the session loop
#[derive(Debug)]
pub enum SessionCommand {
    Connect {
        outbox: Outbox,
        response: oneshot::Sender<ConnectionId>,
    },
    Join {
        id: ConnectionId,
        username: String,
    },
    Move {
        id: ConnectionId,
        movement: Movement,
    },
    Collect {
        id: ConnectionId,
        kind: String,
    },
    Disconnect {
        id: ConnectionId,
    },
}

/// Registry plus the outboxes of every open connection.
struct Session {
    state: SessionRegistry,
    outboxes: HashMap<ConnectionId, Outbox>,
}

impl Session {
    fn send_to(&self, id: &str, msg: ServerMsg) {
        if let Some(outbox) = self.outboxes.get(id) {
            // Receiver gone means a Disconnect is already queued
            let _ = outbox.send(msg);
        }
    }

    fn send_all_except(&self, excluded: Option<&str>, msg: &ServerMsg) {
        for (id, outbox) in &self.outboxes {
            if Some(id.as_str()) != excluded {
                let _ = outbox.send(msg.clone());
            }
        }
    }

    fn send_all(&self, msg: &ServerMsg) {
        self.send_all_except(None, msg);
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Connect { outbox, response } => {
                let id = self.state.connect();
                self.outboxes.insert(id.clone(), outbox);
                if let Err(id) = response.send(id) {
                    // Connection task went away before hearing back
                    self.outboxes.remove(&id);
                    self.state.leave(&id);
                }
            }
            SessionCommand::Join { id, username } => {
                let Some(player) = self.state.join(&id, &username) else {
                    tracing::debug!("Ignoring join from {}: already joined or closed", id);
                    return;
                };
                tracing::info!(
                    "Player {} joined as {:?} ({} online)",
                    id,
                    player.username,
                    self.state.len()
                );
                self.send_to(
                    &id,
                    ServerMsg::Sync(PlayersMsg {
                        players: self.state.snapshot(),
                    }),
                );
                self.send_all_except(
                    Some(&id),
                    &ServerMsg::Joined(JoinedMsg {
                        player: PlayerWire::from(&player),
                    }),
                );
            }
            SessionCommand::Move { id, movement } => {
                if !self.state.apply_move(&id, &movement) {
                    tracing::debug!("Ignoring move from unjoined connection {}", id);
                    return;
                }
                self.send_all(&ServerMsg::Moved(PlayersMsg {
                    players: self.state.snapshot(),
                }));
            }
            SessionCommand::Collect { id, kind } => {
                if !self.state.collect(&id, &kind) {
                    tracing::debug!("Ignoring collect of {:?} from {}", kind, id);
                    return;
                }
                tracing::info!("Player {} collected {}", id, kind);
                self.send_all(&ServerMsg::Collected(CollectedMsg { id, kind }));
            }
            SessionCommand::Disconnect { id } => {
                self.outboxes.remove(&id);
                if self.state.leave(&id).is_some() {
                    tracing::info!("Player {} left ({} online)", id, self.state.len());
                    self.send_all(&ServerMsg::Left(LeftMsg { id }));
                }
            }
        }
    }
}

/// Run the session loop. Owns the registry and every connection's outbox;
/// each command runs to completion before the next is taken, so no locking
/// is needed.
pub async fn run_session_loop(
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    server_config: ServerConfig,
) {
    let mut session = Session {
        state: SessionRegistry::new(server_config.session, server_config.rng_seed),
        outboxes: HashMap::new(),
    };

    while let Some(cmd) = cmd_rx.recv().await {
        session.handle_command(cmd);
    }

    tracing::info!("Session loop ended");
}
