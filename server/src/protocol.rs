//! Wire types live in `satlaunch-shared`; this module re-exports them and
//! converts server-side records into their wire form.

pub use satlaunch_shared::protocol::*;

use crate::player::Player;

impl From<&Player> for PlayerWire {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            username: player.username.clone(),
            position: player.position,
            rotation: player.rotation,
            is_moving: player.is_moving,
            is_jumping: player.is_jumping,
            collected_components: player.collected_components.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satlaunch_shared::config::SessionConfig;

    #[test]
    fn wire_form_carries_every_field() {
        let mut player = Player::spawn("abc123".to_string(), "", &SessionConfig::default());
        player.collect("Battery");
        player.is_jumping = true;

        let wire = PlayerWire::from(&player);
        assert_eq!(wire.id, "abc123");
        assert_eq!(wire.username, "Player-abc12");
        assert_eq!(
            wire.position,
            Position {
                x: 0.0,
                y: 0.25,
                z: 0.0,
            }
        );
        assert!(wire.is_jumping);
        assert!(!wire.is_moving);
        assert_eq!(wire.collected_components, vec!["Battery"]);

        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("\"username\":\"Player-abc12\""));
        assert!(json.contains("\"isJumping\":true"));
    }
}
