use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::db::gateway::{insert_records, update_record, Entity, GatewayError, PersistenceGateway};
use crate::db::tournament_queries::TournamentQueries;
use crate::models::common::MatchStatus;
use crate::models::match_map::{MapPatch, MatchMap, NewMatchMap};
use crate::models::matches::{
    Match, NewMatch, ScheduleEntry, ScheduleMatchesRequest, ScheduledMatch, MIN_MAPS_PER_MATCH,
};
use crate::reconcile::{
    build_draft, check_ownership, map_winner, EditSession, MatchDraft, ReconcilePlan, RosterSizes,
    SessionError, StoredMaps, SubmissionOutcome, ValidationError,
};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Match {0} not found")]
    MatchNotFound(Uuid),
    #[error("Map {0} not found in this match")]
    MapNotFound(Uuid),
    #[error("Team {0} not found")]
    TeamNotFound(Uuid),
    #[error("Match {0} is already being saved")]
    SubmissionInFlight(Uuid),
    #[error("Draft belongs to match {draft}, not {requested}")]
    DraftMismatch { requested: Uuid, draft: Uuid },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Releases a match's in-flight marker when the submission ends, however it ends.
struct InFlight<'a> {
    matches: &'a Mutex<HashSet<Uuid>>,
    match_id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.matches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.match_id);
    }
}

/// Loads, previews and saves match results, and schedules new matches
pub struct MatchEditorService {
    queries: TournamentQueries,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl MatchEditorService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            queries: TournamentQueries::new(gateway),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn gateway(&self) -> &dyn PersistenceGateway {
        self.queries.gateway()
    }

    fn claim(&self, match_id: Uuid) -> Result<InFlight<'_>, EditorError> {
        let mut matches = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches.insert(match_id) {
            return Err(EditorError::SubmissionInFlight(match_id));
        }
        Ok(InFlight { matches: &self.in_flight, match_id })
    }

    async fn require_match(&self, match_id: Uuid) -> Result<Match, EditorError> {
        self.queries
            .get_match(match_id)
            .await?
            .ok_or(EditorError::MatchNotFound(match_id))
    }

    /// Roster sizes of the selected teams plus every team a stat line points at
    async fn roster_sizes(&self, draft: &MatchDraft) -> Result<RosterSizes, EditorError> {
        let mut team_ids = vec![draft.team1_id, draft.team2_id];
        for map in &draft.maps {
            for stat in &map.row().stats {
                if !team_ids.contains(&stat.row().team_id) {
                    team_ids.push(stat.row().team_id);
                }
            }
        }
        Ok(self.queries.get_roster_sizes(&team_ids).await?)
    }

    fn check_draft(match_id: Uuid, draft: &MatchDraft) -> Result<(), EditorError> {
        if draft.match_id != match_id {
            return Err(EditorError::DraftMismatch { requested: match_id, draft: draft.match_id });
        }
        Ok(())
    }

    /// Map and stat identities the match owns in the store
    async fn stored_maps(&self, match_id: Uuid) -> Result<StoredMaps, EditorError> {
        let maps = self.queries.get_match_maps(match_id).await?;
        let map_ids: Vec<Uuid> = maps.iter().map(|m| m.id).collect();
        let mut stored: StoredMaps = map_ids.iter().map(|id| (*id, HashSet::new())).collect();
        for stat in self.queries.get_stats_for_maps(&map_ids).await? {
            stored.entry(stat.map_id).or_default().insert(stat.id);
        }
        Ok(stored)
    }

    /// Editable draft built from the stored match, its maps, stats and both rosters
    #[tracing::instrument(name = "Load match draft", skip(self))]
    pub async fn load_draft(&self, match_id: Uuid) -> Result<MatchDraft, EditorError> {
        let match_row = self.require_match(match_id).await?;
        let maps = self.queries.get_match_maps(match_id).await?;
        let map_ids: Vec<Uuid> = maps.iter().map(|m| m.id).collect();
        let stats = self.queries.get_stats_for_maps(&map_ids).await?;
        let team1_roster = self.queries.get_roster(match_row.team1_id).await?;
        let team2_roster = self.queries.get_roster(match_row.team2_id).await?;

        Ok(build_draft(&match_row, &maps, &team1_roster, &team2_roster, &stats))
    }

    /// The operations a submission of `draft` would issue, without running them
    #[tracing::instrument(name = "Preview match draft", skip(self, draft))]
    pub async fn preview(&self, match_id: Uuid, draft: MatchDraft) -> Result<ReconcilePlan, EditorError> {
        Self::check_draft(match_id, &draft)?;
        self.require_match(match_id).await?;
        check_ownership(&draft, &self.stored_maps(match_id).await?)?;
        let rosters = self.roster_sizes(&draft).await?;

        let mut session = EditSession::new();
        session.begin(draft)?;
        Ok(session.preview(&rosters)?)
    }

    /// Reconcile the store with `draft`.
    ///
    /// Only one submission per match runs at a time; a second one is rejected
    /// rather than queued.
    #[tracing::instrument(name = "Submit match draft", skip(self, draft))]
    pub async fn submit(&self, match_id: Uuid, draft: MatchDraft) -> Result<SubmissionOutcome, EditorError> {
        Self::check_draft(match_id, &draft)?;
        let _in_flight = self.claim(match_id)?;

        self.require_match(match_id).await?;
        check_ownership(&draft, &self.stored_maps(match_id).await?)?;
        let rosters = self.roster_sizes(&draft).await?;

        let mut session = EditSession::new();
        session.begin(draft)?;
        let outcome = session.submit(self.gateway(), &rosters).await?;

        tracing::info!(
            "Saved match {}: {}-{}, {} maps added, {} deleted",
            match_id,
            outcome.score.team1,
            outcome.score.team2,
            outcome.inserted_maps.len(),
            outcome.maps_deleted
        );
        Ok(outcome)
    }

    /// Delete a single map, renumber the remaining ones and refresh the match score.
    ///
    /// Refused when the match would drop below the minimum map count.
    #[tracing::instrument(name = "Delete match map", skip(self))]
    pub async fn delete_map(&self, match_id: Uuid, map_id: Uuid) -> Result<Vec<MatchMap>, EditorError> {
        let _in_flight = self.claim(match_id)?;
        let match_row = self.require_match(match_id).await?;
        let maps = self.queries.get_match_maps(match_id).await?;

        if !maps.iter().any(|m| m.id == map_id) {
            return Err(EditorError::MapNotFound(map_id));
        }
        if maps.len() <= MIN_MAPS_PER_MATCH {
            return Err(SessionError::TooFewMaps { minimum: MIN_MAPS_PER_MATCH }.into());
        }

        self.gateway().delete(Entity::MatchMaps, map_id).await?;

        let mut remaining: Vec<MatchMap> = maps.into_iter().filter(|m| m.id != map_id).collect();
        let (mut team1_score, mut team2_score) = (0, 0);
        for (position, map) in remaining.iter_mut().enumerate() {
            let map_number = position as u32 + 1;
            if map.map_number != map_number {
                map.map_number = map_number;
                let patch = MapPatch {
                    map_number,
                    map_name: map.map_name.clone(),
                    team1_score: map.team1_score,
                    team2_score: map.team2_score,
                    winner_id: map.winner_id,
                    status: map.status,
                };
                update_record(self.gateway(), Entity::MatchMaps, map.id, &patch).await?;
            }
            match map_winner(match_row.team1_id, match_row.team2_id, map.team1_score, map.team2_score) {
                Some(winner) if winner == match_row.team1_id => team1_score += 1,
                Some(_) => team2_score += 1,
                None => {}
            }
        }

        update_record(
            self.gateway(),
            Entity::Matches,
            match_id,
            &serde_json::json!({ "team1_score": team1_score, "team2_score": team2_score }),
        )
        .await?;

        Ok(remaining)
    }

    /// Delete a match together with its maps and stats
    #[tracing::instrument(name = "Delete match", skip(self))]
    pub async fn delete_match(&self, match_id: Uuid) -> Result<(), EditorError> {
        let _in_flight = self.claim(match_id)?;
        match self.gateway().delete(Entity::Matches, match_id).await {
            Err(GatewayError::NotFound { .. }) => Err(EditorError::MatchNotFound(match_id)),
            other => Ok(other?),
        }
    }

    /// Create matches and their empty maps.
    ///
    /// Every entry is validated before anything is written.
    #[tracing::instrument(name = "Schedule matches", skip(self, request), fields(count = request.matches.len()))]
    pub async fn schedule(&self, request: ScheduleMatchesRequest) -> Result<Vec<ScheduledMatch>, EditorError> {
        if request.matches.is_empty() {
            return Err(ValidationError::EmptySchedule.into());
        }

        let default_map_count = request.map_count.unwrap_or(MIN_MAPS_PER_MATCH as u32);
        let new_matches = request
            .matches
            .iter()
            .map(|entry| validate_entry(entry, default_map_count))
            .collect::<Result<Vec<NewMatch>, ValidationError>>()?;

        let mut team_ids: Vec<Uuid> = new_matches
            .iter()
            .flat_map(|m| [m.team1_id, m.team2_id])
            .collect();
        team_ids.sort();
        team_ids.dedup();
        let known: HashSet<Uuid> = self
            .queries
            .get_teams_by_ids(&team_ids)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if let Some(missing) = team_ids.iter().find(|id| !known.contains(id)) {
            return Err(EditorError::TeamNotFound(*missing));
        }

        let matches = insert_records::<Match, _>(self.gateway(), &new_matches).await?;

        let new_maps: Vec<NewMatchMap> = matches
            .iter()
            .flat_map(|m| (1..=m.map_count).map(move |n| NewMatchMap::scheduled(m.id, n)))
            .collect();
        let maps = insert_records::<MatchMap, _>(self.gateway(), &new_maps).await?;

        let mut maps_by_match: HashMap<Uuid, Vec<MatchMap>> = HashMap::new();
        for map in maps {
            maps_by_match.entry(map.match_id).or_default().push(map);
        }

        tracing::info!("Scheduled {} matches with {} maps", matches.len(), new_maps.len());

        Ok(matches
            .into_iter()
            .map(|match_row| ScheduledMatch {
                maps: maps_by_match.remove(&match_row.id).unwrap_or_default(),
                match_row,
            })
            .collect())
    }
}

fn validate_entry(entry: &ScheduleEntry, default_map_count: u32) -> Result<NewMatch, ValidationError> {
    let (Some(team1_id), Some(team2_id)) = (entry.team1_id, entry.team2_id) else {
        return Err(ValidationError::MissingTeams);
    };
    if team1_id == team2_id {
        return Err(ValidationError::IdenticalTeams);
    }
    let scheduled_at = entry.scheduled_at.ok_or(ValidationError::MissingDate)?;
    let map_count = entry.map_count.unwrap_or(default_map_count);
    if (map_count as usize) < MIN_MAPS_PER_MATCH {
        return Err(ValidationError::TooFewMaps { count: map_count as usize });
    }

    Ok(NewMatch {
        team1_id,
        team2_id,
        scheduled_at,
        status: MatchStatus::Scheduled,
        team1_score: 0,
        team2_score: 0,
        map_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            team1_id: Some(Uuid::new_v4()),
            team2_id: Some(Uuid::new_v4()),
            scheduled_at: Some(Utc::now()),
            map_count: None,
        }
    }

    #[test]
    fn entry_needs_both_teams() {
        let missing = ScheduleEntry { team2_id: None, ..entry() };
        assert_eq!(validate_entry(&missing, 3).unwrap_err(), ValidationError::MissingTeams);
    }

    #[test]
    fn entry_needs_distinct_teams() {
        let team = Uuid::new_v4();
        let same = ScheduleEntry { team1_id: Some(team), team2_id: Some(team), ..entry() };
        assert_eq!(validate_entry(&same, 3).unwrap_err(), ValidationError::IdenticalTeams);
    }

    #[test]
    fn entry_needs_a_date() {
        let undated = ScheduleEntry { scheduled_at: None, ..entry() };
        assert_eq!(validate_entry(&undated, 3).unwrap_err(), ValidationError::MissingDate);
    }

    #[test]
    fn entry_map_count_falls_back_to_request_default() {
        assert_eq!(validate_entry(&entry(), 3).unwrap().map_count, 3);
        let own = ScheduleEntry { map_count: Some(5), ..entry() };
        assert_eq!(validate_entry(&own, 3).unwrap().map_count, 5);
        let single = ScheduleEntry { map_count: Some(1), ..entry() };
        assert_eq!(
            validate_entry(&single, 3).unwrap_err(),
            ValidationError::TooFewMaps { count: 1 }
        );
    }

    #[test]
    fn in_flight_marker_is_released_on_drop() {
        let service = MatchEditorService::new(Arc::new(crate::db::MemoryGateway::new()));
        let match_id = Uuid::new_v4();
        {
            let _first = service.claim(match_id).unwrap();
            assert!(matches!(
                service.claim(match_id),
                Err(EditorError::SubmissionInFlight(id)) if id == match_id
            ));
        }
        assert!(service.claim(match_id).is_ok());
    }

    #[test]
    fn poisoned_marker_set_still_admits_submissions() {
        let service = MatchEditorService::new(Arc::new(crate::db::MemoryGateway::new()));
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _held = service.in_flight.lock().unwrap();
                    panic!("submission panicked while holding the marker set");
                })
                .join();
        });
        assert!(service.in_flight.is_poisoned());

        let match_id = Uuid::new_v4();
        {
            let _claimed = service.claim(match_id).unwrap();
            assert!(service.claim(match_id).is_err());
        }
        assert!(service.claim(match_id).is_ok());
    }
}
