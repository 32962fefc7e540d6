use crate::player::{generate_connection_id, ConnectionId, Movement, Player};
use crate::protocol::{PlayerWire, PlayersMap};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use satlaunch_shared::config::SessionConfig;
use std::collections::{HashMap, HashSet};

/// Session register owned by the session loop task.
///
/// Tracks open connections and the players that have joined on them. A player
/// exists only while its connection is open and after it has sent `join`.
pub struct SessionRegistry {
    players: HashMap<ConnectionId, Player>,
    connections: HashSet<ConnectionId>,
    config: SessionConfig,
    rng: ChaCha8Rng,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig, rng_seed: u64) -> Self {
        Self {
            players: HashMap::new(),
            connections: HashSet::new(),
            config,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    /// Register a new open connection and return its id.
    pub fn connect(&mut self) -> ConnectionId {
        loop {
            let id = generate_connection_id(&mut self.rng);
            if self.connections.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Create a player for an open connection.
    /// Returns None if the connection is unknown or has already joined.
    pub fn join(&mut self, id: &str, requested_name: &str) -> Option<Player> {
        if !self.connections.contains(id) || self.players.contains_key(id) {
            return None;
        }
        let player = Player::spawn(id.to_string(), requested_name, &self.config);
        self.players.insert(player.id.clone(), player.clone());
        Some(player)
    }

    /// Overwrite a joined player's movement state. Returns false if not joined.
    pub fn apply_move(&mut self, id: &str, movement: &Movement) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.apply_movement(movement);
                true
            }
            None => false,
        }
    }

    /// Returns true only when `kind` was newly added to the player's set.
    pub fn collect(&mut self, id: &str, kind: &str) -> bool {
        self.players
            .get_mut(id)
            .is_some_and(|player| player.collect(kind))
    }

    /// Close a connection, returning its player if it had joined.
    pub fn leave(&mut self, id: &str) -> Option<Player> {
        self.connections.remove(id);
        self.players.remove(id)
    }

    /// Entire registry in wire form
    pub fn snapshot(&self) -> PlayersMap {
        self.players
            .iter()
            .map(|(id, p)| (id.clone(), PlayerWire::from(p)))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Position;

    fn test_registry() -> SessionRegistry {
        SessionRegistry::new(SessionConfig::default(), 12345)
    }

    fn moved_to(x: f64, z: f64) -> Movement {
        Movement {
            position: Position { x, y: 0.25, z },
            rotation: 0.5,
            is_moving: true,
            is_jumping: false,
        }
    }

    #[test]
    fn connect_assigns_unique_ids() {
        let mut reg = test_registry();
        let a = reg.connect();
        let b = reg.connect();
        assert_ne!(a, b);
        assert_eq!(reg.connection_count(), 2);
        assert!(reg.is_empty(), "connecting alone does not create players");
    }

    #[test]
    fn join_creates_player_at_spawn() {
        let mut reg = test_registry();
        let id = reg.connect();
        let player = reg.join(&id, "Rae").unwrap();
        assert_eq!(player.username, "Rae");
        assert_eq!(
            player.position,
            Position {
                x: 0.0,
                y: 0.25,
                z: 0.0,
            }
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn join_twice_is_noop() {
        let mut reg = test_registry();
        let id = reg.connect();
        assert!(reg.join(&id, "Rae").is_some());
        reg.apply_move(&id, &moved_to(1.0, 1.0));
        assert!(reg.join(&id, "Someone else").is_none());
        assert_eq!(reg.len(), 1);
        let p = reg.get(&id).unwrap();
        assert_eq!(p.username, "Rae");
        assert_eq!(p.position.x, 1.0, "rejoin must not reset state");
    }

    #[test]
    fn join_from_unknown_connection_ignored() {
        let mut reg = test_registry();
        assert!(reg.join("ghost", "Rae").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn move_requires_join() {
        let mut reg = test_registry();
        let id = reg.connect();
        assert!(!reg.apply_move(&id, &moved_to(3.0, 4.0)));
        assert!(!reg.contains(&id));
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn move_overwrites_in_place() {
        let mut reg = test_registry();
        let id = reg.connect();
        reg.join(&id, "Rae");
        assert!(reg.apply_move(&id, &moved_to(3.0, 4.0)));
        let p = reg.get(&id).unwrap();
        assert_eq!(
            p.position,
            Position {
                x: 3.0,
                y: 0.25,
                z: 4.0,
            }
        );
        assert!(p.is_moving);
    }

    #[test]
    fn collect_is_idempotent_per_player() {
        let mut reg = test_registry();
        let a = reg.connect();
        let b = reg.connect();
        reg.join(&a, "A");
        reg.join(&b, "B");

        assert!(reg.collect(&a, "Antenna"));
        assert!(!reg.collect(&a, "Antenna"));
        // Same kind for another player is still new
        assert!(reg.collect(&b, "Antenna"));

        assert_eq!(reg.get(&a).unwrap().collected_components, vec!["Antenna"]);
    }

    #[test]
    fn collect_requires_join() {
        let mut reg = test_registry();
        let id = reg.connect();
        assert!(!reg.collect(&id, "Antenna"));
    }

    #[test]
    fn leave_removes_player_and_connection() {
        let mut reg = test_registry();
        let a = reg.connect();
        let b = reg.connect();
        reg.join(&a, "A");

        assert!(reg.leave(&a).is_some());
        assert!(reg.leave(&b).is_none(), "never joined");
        assert!(reg.is_empty());
        assert_eq!(reg.connection_count(), 0);

        // A closed connection cannot join again
        assert!(reg.join(&a, "A").is_none());
    }

    #[test]
    fn snapshot_keys_match_ids() {
        let mut reg = test_registry();
        let a = reg.connect();
        let b = reg.connect();
        reg.join(&a, "A");
        reg.join(&b, "");

        let snap = reg.snapshot();
        assert_eq!(snap.len(), 2);
        for (key, player) in &snap {
            assert_eq!(key, &player.id);
        }
        assert!(snap[&b].username.starts_with("Player-"));
    }
}
