//! Editable in-memory representation of a match's maps and player statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::common::MatchStatus;
use crate::models::match_map::MatchMap;
use crate::models::matches::Match;
use crate::models::player::Player;
use crate::models::player_stat::PlayerStat;

/// Stat placeholders are only created for this many players per side
pub const MAX_LINEUP_PER_SIDE: usize = 10;

/// A row that either already exists in the store or was created during the edit session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Tracked<T> {
    Persisted { id: Uuid, row: T },
    Draft { row: T },
}

impl<T> Tracked<T> {
    pub fn persisted(id: Uuid, row: T) -> Self {
        Tracked::Persisted { id, row }
    }

    pub fn draft(row: T) -> Self {
        Tracked::Draft { row }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Tracked::Persisted { id, .. } => Some(*id),
            Tracked::Draft { .. } => None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Tracked::Persisted { .. })
    }

    pub fn row(&self) -> &T {
        match self {
            Tracked::Persisted { row, .. } | Tracked::Draft { row } => row,
        }
    }

    pub fn row_mut(&mut self) -> &mut T {
        match self {
            Tracked::Persisted { row, .. } | Tracked::Draft { row } => row,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatLine {
    pub player_id: Uuid,
    pub team_id: Uuid,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

impl StatLine {
    pub fn zeroed(player_id: Uuid, team_id: Uuid) -> Self {
        Self { player_id, team_id, kills: 0, deaths: 0, assists: 0 }
    }

    pub fn is_all_zero(&self) -> bool {
        self.kills == 0 && self.deaths == 0 && self.assists == 0
    }
}

impl From<&PlayerStat> for StatLine {
    fn from(stat: &PlayerStat) -> Self {
        Self {
            player_id: stat.player_id,
            team_id: stat.team_id,
            kills: stat.kills,
            deaths: stat.deaths,
            assists: stat.assists,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapDraft {
    /// `None` lets the reconciler pick the next free sequence number
    #[serde(default)]
    pub map_number: Option<u32>,
    #[serde(default)]
    pub map_name: Option<String>,
    pub team1_score: u32,
    pub team2_score: u32,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub stats: Vec<Tracked<StatLine>>,
}

impl MapDraft {
    /// Fresh map with a zeroed stat line for every lineup slot
    pub fn empty(lineup: &[LineupSlot]) -> Self {
        Self {
            map_number: None,
            map_name: None,
            team1_score: 0,
            team2_score: 0,
            status: MatchStatus::Scheduled,
            stats: lineup
                .iter()
                .map(|slot| Tracked::draft(StatLine::zeroed(slot.player_id, slot.team_id)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LineupSlot {
    pub player_id: Uuid,
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchDraft {
    pub match_id: Uuid,
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: MatchStatus,
    /// Players that receive stat placeholders, team1 side first
    #[serde(default)]
    pub lineup: Vec<LineupSlot>,
    pub maps: Vec<Tracked<MapDraft>>,
    /// Persisted maps dropped during the session
    #[serde(default)]
    pub removed_maps: Vec<Uuid>,
}

/// First [`MAX_LINEUP_PER_SIDE`] players of each roster, team1 first.
pub fn lineup(team1_id: Uuid, team1_roster: &[Player], team2_id: Uuid, team2_roster: &[Player]) -> Vec<LineupSlot> {
    let side = |team_id: Uuid, roster: &[Player]| {
        roster
            .iter()
            .take(MAX_LINEUP_PER_SIDE)
            .map(|player| LineupSlot { player_id: player.id, team_id })
            .collect::<Vec<_>>()
    };
    let mut slots = side(team1_id, team1_roster);
    slots.extend(side(team2_id, team2_roster));
    slots
}

/// Derive the editable draft of a match from its persisted rows.
///
/// Every map gets one stat line per lineup slot: the persisted row for that
/// (map, player) pair when there is one, a zeroed [`Tracked::Draft`] line
/// otherwise. Persisted rows of players outside the lineup are not carried.
pub fn build_draft(
    match_row: &Match,
    maps: &[MatchMap],
    team1_roster: &[Player],
    team2_roster: &[Player],
    stats: &[PlayerStat],
) -> MatchDraft {
    let lineup = lineup(match_row.team1_id, team1_roster, match_row.team2_id, team2_roster);

    let persisted: HashMap<(Uuid, Uuid), &PlayerStat> = stats
        .iter()
        .map(|stat| ((stat.map_id, stat.player_id), stat))
        .collect();

    let maps = maps
        .iter()
        .map(|map| {
            let stats = lineup
                .iter()
                .map(|slot| match persisted.get(&(map.id, slot.player_id)) {
                    Some(stat) => Tracked::persisted(stat.id, StatLine::from(*stat)),
                    None => Tracked::draft(StatLine::zeroed(slot.player_id, slot.team_id)),
                })
                .collect();
            Tracked::persisted(
                map.id,
                MapDraft {
                    map_number: Some(map.map_number),
                    map_name: map.map_name.clone(),
                    team1_score: map.team1_score,
                    team2_score: map.team2_score,
                    status: map.status,
                    stats,
                },
            )
        })
        .collect();

    MatchDraft {
        match_id: match_row.id,
        team1_id: match_row.team1_id,
        team2_id: match_row.team2_id,
        scheduled_at: match_row.scheduled_at,
        status: match_row.status,
        lineup,
        maps,
        removed_maps: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_serializes_with_state_tag() {
        let id = Uuid::new_v4();
        let line = StatLine::zeroed(Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(Tracked::persisted(id, line.clone())).unwrap();
        assert_eq!(json["state"], "persisted");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["row"]["kills"], 0);

        let back: Tracked<StatLine> =
            serde_json::from_value(serde_json::json!({ "state": "draft", "row": line })).unwrap();
        assert!(!back.is_persisted());
        assert_eq!(back.id(), None);
    }
}
