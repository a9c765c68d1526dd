use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::gateway::{Entity, Record};
use crate::models::common::kd_ratio;

/// Per-map kill/death/assist line of one player
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerStat {
    pub id: Uuid,
    pub map_id: Uuid,
    pub player_id: Uuid,
    /// Team the player represented in this map, kept even if they transfer later
    pub team_id: Uuid,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

impl Record for PlayerStat {
    const ENTITY: Entity = Entity::MapPlayerStats;
}

impl PlayerStat {
    pub fn kd_ratio(&self) -> f64 {
        kd_ratio(self.kills, self.deaths)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewPlayerStat {
    pub map_id: Uuid,
    pub player_id: Uuid,
    pub team_id: Uuid,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

/// Only the counters are rewritten on an existing stat row
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StatPatch {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}
