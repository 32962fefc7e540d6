use crate::protocol::Position;

/// Session configuration: how new players are spawned and named.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Where every player appears on join
    pub spawn_position: Position,
    /// Prefix of the generated name given to players that join without one
    pub username_prefix: String,
    /// How many leading characters of the connection id follow the prefix
    pub username_id_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn_position: Position {
                x: 0.0,
                y: 0.25,
                z: 0.0,
            },
            username_prefix: "Player-".to_string(),
            username_id_chars: 5,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let p = self.spawn_position;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err("spawn_position must be finite".to_string());
        }
        if self.username_prefix.is_empty() && self.username_id_chars == 0 {
            return Err("generated usernames would be empty".to_string());
        }
        Ok(())
    }
}
