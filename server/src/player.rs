use crate::protocol::Position;
use rand::distributions::Alphanumeric;
use rand::Rng;
use satlaunch_shared::config::SessionConfig;

/// Opaque per-connection identifier, stable for the connection's lifetime.
pub type ConnectionId = String;

/// Length of generated connection ids
pub const CONNECTION_ID_LEN: usize = 20;

/// A joined player. One per open connection that has sent `join`.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: ConnectionId,
    pub username: String,
    pub position: Position,
    /// Heading about the vertical axis (radians)
    pub rotation: f64,
    pub is_moving: bool,
    pub is_jumping: bool,
    /// Component kinds in collection order, never repeated
    pub collected_components: Vec<String>,
}

/// Client-reported movement state, applied verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub position: Position,
    pub rotation: f64,
    pub is_moving: bool,
    pub is_jumping: bool,
}

impl Player {
    /// New player standing at the spawn point with nothing collected.
    pub fn spawn(id: ConnectionId, requested_name: &str, config: &SessionConfig) -> Self {
        let username = display_name(requested_name, &id, config);
        Self {
            id,
            username,
            position: config.spawn_position,
            rotation: 0.0,
            is_moving: false,
            is_jumping: false,
            collected_components: Vec::new(),
        }
    }

    pub fn apply_movement(&mut self, movement: &Movement) {
        self.position = movement.position;
        self.rotation = movement.rotation;
        self.is_moving = movement.is_moving;
        self.is_jumping = movement.is_jumping;
    }

    /// Record a collected component. Returns false if it was already held.
    pub fn collect(&mut self, kind: &str) -> bool {
        if self.collected_components.iter().any(|k| k == kind) {
            return false;
        }
        self.collected_components.push(kind.to_string());
        true
    }
}

/// The requested name, or `<prefix><start of id>` when none was given.
pub fn display_name(requested: &str, id: &str, config: &SessionConfig) -> String {
    if !requested.is_empty() {
        return requested.to_string();
    }
    let short: String = id.chars().take(config.username_id_chars).collect();
    format!("{}{}", config.username_prefix, short)
}

/// Random alphanumeric connection id.
pub fn generate_connection_id<R: Rng>(rng: &mut R) -> ConnectionId {
    std::iter::repeat_with(|| char::from(rng.sample(Alphanumeric)))
        .take(CONNECTION_ID_LEN)
        .collect()
}
