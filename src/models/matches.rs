use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::gateway::{Entity, Record};
use crate::models::common::MatchStatus;
use crate::models::match_map::MatchMap;
use crate::models::player_stat::PlayerStat;
use crate::models::team::Team;

/// A match never has fewer maps than this once maps exist
pub const MIN_MAPS_PER_MATCH: usize = 2;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub team1_score: u32,
    pub team2_score: u32,
    pub map_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Record for Match {
    const ENTITY: Entity = Entity::Matches;
}

impl Match {
    pub fn involves(&self, team_id: Uuid) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    /// Winner by aggregate map score; `None` on a tie
    pub fn winner(&self) -> Option<Uuid> {
        if self.team1_score > self.team2_score {
            Some(self.team1_id)
        } else if self.team2_score > self.team1_score {
            Some(self.team2_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewMatch {
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub team1_score: u32,
    pub team2_score: u32,
    pub map_count: u32,
}

/// Fields rewritten on every draft submission
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchPatch {
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub team1_score: u32,
    pub team2_score: u32,
}

/// One entry of a bulk schedule request. Every field is optional on the wire so
/// that a missing selection becomes a validation message instead of a parse error.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ScheduleEntry {
    pub team1_id: Option<Uuid>,
    pub team2_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub map_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduleMatchesRequest {
    pub matches: Vec<ScheduleEntry>,
    /// Applied to entries without their own map count
    pub map_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduledMatch {
    #[serde(rename = "match")]
    pub match_row: Match,
    pub maps: Vec<MatchMap>,
}

#[derive(Debug, Deserialize)]
pub struct MatchQueryParams {
    pub status: Option<MatchStatus>,
    pub team_id: Option<Uuid>,
}

/// Match page payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchDetail {
    #[serde(rename = "match")]
    pub match_row: Match,
    pub team1: Option<Team>,
    pub team2: Option<Team>,
    pub maps: Vec<MapDetail>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MapDetail {
    pub map: MatchMap,
    pub stats: Vec<PlayerStat>,
}
