use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::gateway::{Entity, Record};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub team_id: Option<Uuid>,
    pub role: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Player {
    const ENTITY: Entity = Entity::Players;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewPlayer {
    pub name: String,
    pub team_id: Option<Uuid>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreatePlayerRequest {
    pub name: String,
    pub team_id: Option<Uuid>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

/// Partial update; `team_id: null` moves the player to free agency
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdatePlayerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub team_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Aggregated statistics over every map a player has a stat row for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerCareer {
    pub player_id: Uuid,
    pub name: String,
    pub team_id: Option<Uuid>,
    pub role: Option<String>,
    pub avatar: Option<String>,
    pub maps_played: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub kd_ratio: f64,
}

fn validate_player_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Player name cannot be empty".to_string());
    }
    if name.chars().count() > 32 {
        return Err("Player name cannot exceed 32 characters".to_string());
    }
    Ok(())
}

impl CreatePlayerRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_player_name(&self.name)
    }

    pub fn into_new_player(self) -> NewPlayer {
        NewPlayer {
            name: self.name.trim().to_string(),
            team_id: self.team_id,
            role: self.role.filter(|r| !r.trim().is_empty()),
            avatar: self.avatar.filter(|a| !a.trim().is_empty()),
        }
    }
}

impl UpdatePlayerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.team_id.is_none() && self.role.is_none() && self.avatar.is_none() {
            return Err("At least one field must be provided for update".to_string());
        }
        if let Some(name) = &self.name {
            validate_player_name(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_null_team_clears_membership() {
        let request: UpdatePlayerRequest = serde_json::from_str(r#"{"team_id": null}"#).unwrap();
        assert_eq!(request.team_id, Some(None));
        let patch = serde_json::to_value(&request).unwrap();
        assert_eq!(patch, serde_json::json!({ "team_id": null }));
    }

    #[test]
    fn absent_team_is_left_untouched() {
        let request: UpdatePlayerRequest = serde_json::from_str(r#"{"role": "igl"}"#).unwrap();
        assert_eq!(request.team_id, None);
        let patch = serde_json::to_value(&request).unwrap();
        assert_eq!(patch, serde_json::json!({ "role": "igl" }));
    }
}
