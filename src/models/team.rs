// src/models/team.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::gateway::{Entity, Record};
use crate::models::player::Player;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    /// Emoji glyph shown when no logo image was uploaded
    pub logo: Option<String>,
    /// Object storage reference of the uploaded logo image
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Team {
    const ENTITY: Entity = Entity::Teams;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewTeam {
    pub name: String,
    pub logo: Option<String>,
    pub logo_url: Option<String>,
}

/// Request to create a team
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateTeamRequest {
    pub name: String,
    pub logo: Option<String>,
}

/// Request to update team information
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateTeamRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Derived leaderboard counters, recomputed from completed matches on every read
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TeamStanding {
    pub team_id: Uuid,
    pub team_name: String,
    pub logo: Option<String>,
    pub logo_url: Option<String>,
    pub position: u32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub rounds_won: u32,
    pub rounds_lost: u32,
}

impl TeamStanding {
    pub fn round_difference(&self) -> i64 {
        self.rounds_won as i64 - self.rounds_lost as i64
    }

    pub fn win_percentage(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            (self.wins as f64 / self.matches_played as f64) * 100.0
        }
    }
}

/// Team page payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TeamDetail {
    pub team: Team,
    pub roster: Vec<Player>,
    pub standing: Option<TeamStanding>,
}

fn validate_team_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Team name cannot be empty".to_string());
    }

    if name.chars().count() > 50 {
        return Err("Team name cannot exceed 50 characters".to_string());
    }

    if !name.chars().any(|c| c.is_alphanumeric()) {
        return Err("Team name must contain at least one letter or number".to_string());
    }

    Ok(())
}

fn validate_logo(logo: &str) -> Result<(), String> {
    if logo.chars().count() > 10 {
        return Err("Team logo glyph must be 10 characters or less".to_string());
    }
    Ok(())
}

impl CreateTeamRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_team_name(&self.name)?;
        if let Some(logo) = &self.logo {
            validate_logo(logo)?;
        }
        Ok(())
    }

    pub fn into_new_team(self) -> NewTeam {
        NewTeam {
            name: self.name.trim().to_string(),
            logo: self.logo.filter(|l| !l.trim().is_empty()),
            logo_url: None,
        }
    }
}

impl UpdateTeamRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.logo.is_none() {
            return Err("At least one field must be provided for update".to_string());
        }
        if let Some(name) = &self.name {
            validate_team_name(name)?;
        }
        if let Some(logo) = &self.logo {
            validate_logo(logo)?;
        }
        Ok(())
    }

    pub fn sanitized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_blank_name() {
        let request = CreateTeamRequest { name: "   ".into(), logo: None };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_request_requires_a_field() {
        assert!(UpdateTeamRequest::default().validate().is_err());
        let request = UpdateTeamRequest { name: Some("Night Owls".into()), logo: None };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_patch_omits_untouched_fields() {
        let request = UpdateTeamRequest { name: None, logo: Some("🦉".into()) };
        let patch = serde_json::to_value(&request).unwrap();
        assert_eq!(patch, serde_json::json!({ "logo": "🦉" }));
    }
}
