//! Turns an edited [`MatchDraft`] into the exact set of store operations.
//!
//! Planning is pure: nothing here touches the gateway, so every decision
//! (winners, sequence numbers, which stat rows survive) can be inspected or
//! previewed before [`crate::reconcile::pipeline::execute`] runs it.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::common::ScorePair;
use crate::models::match_map::{MapPatch, NewMatchMap};
use crate::models::matches::{MatchPatch, MIN_MAPS_PER_MATCH};
use crate::models::player_stat::StatPatch;
use crate::reconcile::draft::{MatchDraft, StatLine, Tracked};

/// All-zero stat rows are dropped for rosters larger than this
pub const ZERO_ROW_ROSTER_THRESHOLD: usize = 5;

/// Current roster size per team id
pub type RosterSizes = HashMap<Uuid, usize>;

/// Stored stat row ids per map of the match being edited
pub type StoredMaps = HashMap<Uuid, HashSet<Uuid>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select two different teams")]
    IdenticalTeams,
    #[error("A match needs at least 2 maps, found {count}")]
    TooFewMaps { count: usize },
    #[error("Map number {0} is used more than once")]
    DuplicateMapNumber(u32),
    #[error("Map numbers start at 1")]
    InvalidMapNumber,
    #[error("Please select both teams")]
    MissingTeams,
    #[error("Please select a date")]
    MissingDate,
    #[error("No matches to schedule")]
    EmptySchedule,
    #[error("Player {player_id} has more than one stat line on a map")]
    DuplicateStatLine { player_id: Uuid },
    #[error("Map {0} is listed more than once")]
    DuplicateMap(Uuid),
    #[error("Map {0} is both kept and removed")]
    MapKeptAndRemoved(Uuid),
    #[error("Map {0} does not belong to this match")]
    ForeignMap(Uuid),
    #[error("Stat row {0} does not belong to its map")]
    ForeignStat(Uuid),
}

/// Side with the strictly higher score, `None` on a tie.
pub fn map_winner(team1_id: Uuid, team2_id: Uuid, team1_score: u32, team2_score: u32) -> Option<Uuid> {
    if team1_score > team2_score {
        Some(team1_id)
    } else if team2_score > team1_score {
        Some(team2_id)
    } else {
        None
    }
}

/// Whether a stat line is worth persisting.
///
/// An all-zero line only survives when its team's roster has at most
/// [`ZERO_ROW_ROSTER_THRESHOLD`] players; unknown teams count as empty rosters.
pub fn keeps_stat(line: &StatLine, rosters: &RosterSizes) -> bool {
    let roster_size = rosters.get(&line.team_id).copied().unwrap_or(0);
    !(line.is_all_zero() && roster_size > ZERO_ROW_ROSTER_THRESHOLD)
}

/// Maps won by each side under the draft's current team selection.
pub fn score_preview(draft: &MatchDraft) -> ScorePair {
    draft.maps.iter().fold(ScorePair::default(), |mut score, map| {
        let map = map.row();
        match map_winner(draft.team1_id, draft.team2_id, map.team1_score, map.team2_score) {
            Some(winner) if winner == draft.team1_id => score.team1 += 1,
            Some(_) => score.team2 += 1,
            None => {}
        }
        score
    })
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatUpdate {
    pub stat_id: Uuid,
    pub player_id: Uuid,
    pub patch: StatPatch,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapUpdate {
    pub map_id: Uuid,
    pub patch: MapPatch,
    pub stat_updates: Vec<StatUpdate>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapInsert {
    pub map: NewMatchMap,
    /// Inserted once the map has an identity; empty means no stat insert
    pub stats: Vec<StatLine>,
}

/// Stat line on an existing map that has no stored row and is therefore not written.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SkippedStat {
    pub map_id: Uuid,
    pub player_id: Uuid,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReconcilePlan {
    pub match_id: Uuid,
    pub match_patch: MatchPatch,
    pub map_deletes: Vec<Uuid>,
    pub map_updates: Vec<MapUpdate>,
    pub map_inserts: Vec<MapInsert>,
    pub skipped_stats: Vec<SkippedStat>,
    pub score: ScorePair,
}

impl ReconcilePlan {
    /// Number of gateway writes the pipeline will issue
    pub fn write_count(&self) -> usize {
        let updates: usize = self.map_updates.iter().map(|m| 1 + m.stat_updates.len()).sum();
        let map_insert = usize::from(!self.map_inserts.is_empty());
        let stat_inserts = self.map_inserts.iter().filter(|m| !m.stats.is_empty()).count();
        self.map_deletes.len() + 1 + updates + map_insert + stat_inserts
    }
}

fn validate(draft: &MatchDraft) -> Result<(), ValidationError> {
    if draft.team1_id == draft.team2_id {
        return Err(ValidationError::IdenticalTeams);
    }
    if !draft.maps.is_empty() && draft.maps.len() < MIN_MAPS_PER_MATCH {
        return Err(ValidationError::TooFewMaps { count: draft.maps.len() });
    }

    let mut kept = HashSet::new();
    for map in &draft.maps {
        if let Some(id) = map.id() {
            if !kept.insert(id) {
                return Err(ValidationError::DuplicateMap(id));
            }
        }
        let mut players = HashSet::new();
        for stat in &map.row().stats {
            let player_id = stat.row().player_id;
            if !players.insert(player_id) {
                return Err(ValidationError::DuplicateStatLine { player_id });
            }
        }
    }

    let mut removed = HashSet::new();
    for id in &draft.removed_maps {
        if kept.contains(id) {
            return Err(ValidationError::MapKeptAndRemoved(*id));
        }
        if !removed.insert(*id) {
            return Err(ValidationError::DuplicateMap(*id));
        }
    }
    Ok(())
}

/// Every persisted identity in `draft` must be one of the match's stored rows.
///
/// Kept and removed map ids must be maps of the match, and persisted stat ids
/// must be rows of the map they are listed under.
pub fn check_ownership(draft: &MatchDraft, stored: &StoredMaps) -> Result<(), ValidationError> {
    if let Some(id) = draft.removed_maps.iter().find(|id| !stored.contains_key(id)) {
        return Err(ValidationError::ForeignMap(*id));
    }
    for map in &draft.maps {
        let Tracked::Persisted { id, row } = map else {
            continue;
        };
        let stat_ids = stored.get(id).ok_or(ValidationError::ForeignMap(*id))?;
        if let Some(stat_id) = row
            .stats
            .iter()
            .filter_map(Tracked::id)
            .find(|stat_id| !stat_ids.contains(stat_id))
        {
            return Err(ValidationError::ForeignStat(stat_id));
        }
    }
    Ok(())
}

/// Compute the operations that make the store match `draft`.
pub fn plan(draft: &MatchDraft, rosters: &RosterSizes) -> Result<ReconcilePlan, ValidationError> {
    validate(draft)?;

    let winner = |team1_score, team2_score| map_winner(draft.team1_id, draft.team2_id, team1_score, team2_score);
    let existing_count = draft.maps.iter().filter(|m| m.is_persisted()).count();

    let mut used_numbers = HashSet::new();
    let mut claim = |number: u32| {
        if number == 0 {
            Err(ValidationError::InvalidMapNumber)
        } else if !used_numbers.insert(number) {
            Err(ValidationError::DuplicateMapNumber(number))
        } else {
            Ok(number)
        }
    };

    let mut map_updates = Vec::new();
    let mut map_inserts = Vec::new();
    let mut skipped_stats = Vec::new();

    for (position, map) in draft.maps.iter().enumerate() {
        match map {
            Tracked::Persisted { id, row } => {
                let map_number = claim(row.map_number.unwrap_or(position as u32 + 1))?;
                let mut stat_updates = Vec::new();
                for stat in row.stats.iter().filter(|s| keeps_stat(s.row(), rosters)) {
                    match stat {
                        Tracked::Persisted { id: stat_id, row: line } => stat_updates.push(StatUpdate {
                            stat_id: *stat_id,
                            player_id: line.player_id,
                            patch: StatPatch {
                                kills: line.kills,
                                deaths: line.deaths,
                                assists: line.assists,
                            },
                        }),
                        Tracked::Draft { row: line } => skipped_stats.push(SkippedStat {
                            map_id: *id,
                            player_id: line.player_id,
                        }),
                    }
                }
                map_updates.push(MapUpdate {
                    map_id: *id,
                    patch: MapPatch {
                        map_number,
                        map_name: row.map_name.clone(),
                        team1_score: row.team1_score,
                        team2_score: row.team2_score,
                        winner_id: winner(row.team1_score, row.team2_score),
                        status: row.status,
                    },
                    stat_updates,
                });
            }
            Tracked::Draft { row } => {
                let default_number = (existing_count + map_inserts.len() + 1) as u32;
                let map_number = claim(row.map_number.unwrap_or(default_number))?;
                map_inserts.push(MapInsert {
                    map: NewMatchMap {
                        match_id: draft.match_id,
                        map_number,
                        map_name: row.map_name.clone(),
                        team1_score: row.team1_score,
                        team2_score: row.team2_score,
                        winner_id: winner(row.team1_score, row.team2_score),
                        status: row.status,
                    },
                    stats: row
                        .stats
                        .iter()
                        .map(Tracked::row)
                        .filter(|line| keeps_stat(line, rosters))
                        .cloned()
                        .collect(),
                });
            }
        }
    }

    let score = score_preview(draft);

    Ok(ReconcilePlan {
        match_id: draft.match_id,
        match_patch: MatchPatch {
            team1_id: draft.team1_id,
            team2_id: draft.team2_id,
            scheduled_at: draft.scheduled_at,
            status: draft.status,
            team1_score: score.team1,
            team2_score: score.team2,
        },
        map_deletes: draft.removed_maps.clone(),
        map_updates,
        map_inserts,
        skipped_stats,
        score,
    })
}
