use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::gateway::{Entity, Record};
use crate::models::common::MatchStatus;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchMap {
    pub id: Uuid,
    pub match_id: Uuid,
    /// 1-based, unique within the match
    pub map_number: u32,
    pub map_name: Option<String>,
    pub team1_score: u32,
    pub team2_score: u32,
    /// `None` means tie or undetermined
    pub winner_id: Option<Uuid>,
    pub status: MatchStatus,
}

impl Record for MatchMap {
    const ENTITY: Entity = Entity::MatchMaps;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewMatchMap {
    pub match_id: Uuid,
    pub map_number: u32,
    pub map_name: Option<String>,
    pub team1_score: u32,
    pub team2_score: u32,
    pub winner_id: Option<Uuid>,
    pub status: MatchStatus,
}

impl NewMatchMap {
    /// Empty map row created alongside a freshly scheduled match
    pub fn scheduled(match_id: Uuid, map_number: u32) -> Self {
        Self {
            match_id,
            map_number,
            map_name: None,
            team1_score: 0,
            team2_score: 0,
            winner_id: None,
            status: MatchStatus::Scheduled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapPatch {
    pub map_number: u32,
    pub map_name: Option<String>,
    pub team1_score: u32,
    pub team2_score: u32,
    pub winner_id: Option<Uuid>,
    pub status: MatchStatus,
}
