//! Sequential execution of a [`ReconcilePlan`].
//!
//! Steps run one at a time in a fixed order because later steps depend on
//! identities returned by earlier ones (stat rows of a new map need the map's
//! id). The first failing step stops the run; writes that already succeeded
//! stay in the store.

use serde::Serialize;
use std::fmt::Display;
use uuid::Uuid;

use crate::db::gateway::{insert_records, update_record, Entity, GatewayError, PersistenceGateway};
use crate::models::common::ScorePair;
use crate::models::match_map::MatchMap;
use crate::models::player_stat::{NewPlayerStat, PlayerStat};
use crate::reconcile::planner::{ReconcilePlan, SkippedStat};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    DeleteMap { map_id: Uuid },
    UpdateMatch,
    UpdateMap { map_id: Uuid },
    UpdateStat { stat_id: Uuid },
    InsertMaps,
    InsertStats { map_number: u32 },
}

impl Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStep::DeleteMap { map_id } => write!(f, "delete map {map_id}"),
            PipelineStep::UpdateMatch => write!(f, "update match"),
            PipelineStep::UpdateMap { map_id } => write!(f, "update map {map_id}"),
            PipelineStep::UpdateStat { stat_id } => write!(f, "update stat {stat_id}"),
            PipelineStep::InsertMaps => write!(f, "insert maps"),
            PipelineStep::InsertStats { map_number } => write!(f, "insert stats of map {map_number}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Submission failed at {step}: {source}")]
pub struct PipelineError {
    pub step: PipelineStep,
    #[source]
    pub source: GatewayError,
}

trait AtStep<T> {
    fn at(self, step: PipelineStep) -> Result<T, PipelineError>;
}

impl<T> AtStep<T> for Result<T, GatewayError> {
    fn at(self, step: PipelineStep) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError { step, source })
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub match_id: Uuid,
    pub score: ScorePair,
    pub maps_deleted: usize,
    pub maps_updated: usize,
    pub stats_updated: usize,
    pub inserted_maps: Vec<MatchMap>,
    pub stats_inserted: usize,
    pub skipped_stats: Vec<SkippedStat>,
}

/// Run `plan` against `gateway`:
/// deletes, match update, existing maps with their stats, new maps, new maps' stats.
#[tracing::instrument(
    name = "Execute reconcile plan",
    skip(plan, gateway),
    fields(match_id = %plan.match_id, writes = plan.write_count())
)]
pub async fn execute(
    plan: &ReconcilePlan,
    gateway: &dyn PersistenceGateway,
) -> Result<SubmissionOutcome, PipelineError> {
    for map_id in &plan.map_deletes {
        gateway
            .delete(Entity::MatchMaps, *map_id)
            .await
            .at(PipelineStep::DeleteMap { map_id: *map_id })?;
    }

    update_record(gateway, Entity::Matches, plan.match_id, &plan.match_patch)
        .await
        .at(PipelineStep::UpdateMatch)?;

    let mut stats_updated = 0;
    for map in &plan.map_updates {
        update_record(gateway, Entity::MatchMaps, map.map_id, &map.patch)
            .await
            .at(PipelineStep::UpdateMap { map_id: map.map_id })?;

        for stat in &map.stat_updates {
            update_record(gateway, Entity::MapPlayerStats, stat.stat_id, &stat.patch)
                .await
                .at(PipelineStep::UpdateStat { stat_id: stat.stat_id })?;
            stats_updated += 1;
        }
    }

    let inserted_maps: Vec<MatchMap> = if plan.map_inserts.is_empty() {
        Vec::new()
    } else {
        let payloads: Vec<_> = plan.map_inserts.iter().map(|m| m.map.clone()).collect();
        insert_records::<MatchMap, _>(gateway, &payloads)
            .await
            .at(PipelineStep::InsertMaps)?
    };

    let mut stats_inserted = 0;
    for (stored, planned) in inserted_maps.iter().zip(&plan.map_inserts) {
        if planned.stats.is_empty() {
            continue;
        }
        let rows: Vec<NewPlayerStat> = planned
            .stats
            .iter()
            .map(|line| NewPlayerStat {
                map_id: stored.id,
                player_id: line.player_id,
                team_id: line.team_id,
                kills: line.kills,
                deaths: line.deaths,
                assists: line.assists,
            })
            .collect();
        let stored_stats = insert_records::<PlayerStat, _>(gateway, &rows)
            .await
            .at(PipelineStep::InsertStats { map_number: stored.map_number })?;
        stats_inserted += stored_stats.len();
    }

    for skipped in &plan.skipped_stats {
        tracing::warn!(
            "Stat line of player {} on map {} has no stored row and was not saved",
            skipped.player_id,
            skipped.map_id
        );
    }

    Ok(SubmissionOutcome {
        match_id: plan.match_id,
        score: plan.score,
        maps_deleted: plan.map_deletes.len(),
        maps_updated: plan.map_updates.len(),
        stats_updated,
        inserted_maps,
        stats_inserted,
        skipped_stats: plan.skipped_stats.clone(),
    })
}
