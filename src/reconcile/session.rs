//! Edit session owning one match draft.
//!
//! `Idle → Editing → Submitting → Committed | Failed`. A failed submission
//! keeps the draft so the operator can fix it and retry; a committed one drops
//! it so the next edit starts from freshly loaded rows.

use serde::Serialize;
use uuid::Uuid;

use crate::db::gateway::PersistenceGateway;
use crate::models::common::{MatchStatus, ScorePair};
use crate::models::matches::MIN_MAPS_PER_MATCH;
use crate::reconcile::draft::{MapDraft, MatchDraft, Tracked};
use crate::reconcile::pipeline::{execute, PipelineError, SubmissionOutcome};
use crate::reconcile::planner::{plan, score_preview, ReconcilePlan, RosterSizes, ValidationError};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Editing,
    Submitting,
    Committed,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A submission is already in progress")]
    Busy,
    #[error("No draft is being edited")]
    NoDraft,
    #[error("A match must keep at least {minimum} maps")]
    TooFewMaps { minimum: usize },
    #[error("Map {0} does not exist in the draft")]
    MapOutOfRange(usize),
    #[error("Player {0} has no stat line on this map")]
    UnknownPlayer(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PipelineError),
}

#[derive(Debug)]
pub struct EditSession {
    state: SessionState,
    draft: Option<MatchDraft>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self { state: SessionState::Idle, draft: None }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn draft(&self) -> Option<&MatchDraft> {
        self.draft.as_ref()
    }

    /// Start editing `draft`, replacing whatever was there unless a submission is running.
    pub fn begin(&mut self, draft: MatchDraft) -> Result<(), SessionError> {
        if self.state == SessionState::Submitting {
            return Err(SessionError::Busy);
        }
        self.draft = Some(draft);
        self.state = SessionState::Editing;
        Ok(())
    }

    fn editable(&mut self) -> Result<&mut MatchDraft, SessionError> {
        match self.state {
            SessionState::Submitting => Err(SessionError::Busy),
            SessionState::Editing | SessionState::Failed => {
                self.state = SessionState::Editing;
                self.draft.as_mut().ok_or(SessionError::NoDraft)
            }
            SessionState::Idle | SessionState::Committed => Err(SessionError::NoDraft),
        }
    }

    fn map_mut(&mut self, index: usize) -> Result<&mut MapDraft, SessionError> {
        self.editable()?
            .maps
            .get_mut(index)
            .map(Tracked::row_mut)
            .ok_or(SessionError::MapOutOfRange(index))
    }

    /// Append a new map with zeroed stat lines for the lineup; returns its index.
    pub fn add_map(&mut self) -> Result<usize, SessionError> {
        let draft = self.editable()?;
        let map = MapDraft::empty(&draft.lineup);
        draft.maps.push(Tracked::draft(map));
        Ok(draft.maps.len() - 1)
    }

    /// Drop a map from the draft and renumber the rest 1..n.
    ///
    /// Refused when the match would end up below the minimum map count.
    pub fn remove_map(&mut self, index: usize) -> Result<(), SessionError> {
        let draft = self.editable()?;
        if index >= draft.maps.len() {
            return Err(SessionError::MapOutOfRange(index));
        }
        if draft.maps.len() <= MIN_MAPS_PER_MATCH {
            return Err(SessionError::TooFewMaps { minimum: MIN_MAPS_PER_MATCH });
        }

        let removed = draft.maps.remove(index);
        if let Some(id) = removed.id() {
            draft.removed_maps.push(id);
        }
        for (position, map) in draft.maps.iter_mut().enumerate() {
            map.row_mut().map_number = Some(position as u32 + 1);
        }
        Ok(())
    }

    pub fn set_map_score(&mut self, index: usize, team1_score: u32, team2_score: u32) -> Result<(), SessionError> {
        let map = self.map_mut(index)?;
        map.team1_score = team1_score;
        map.team2_score = team2_score;
        Ok(())
    }

    pub fn set_map_name(&mut self, index: usize, map_name: Option<String>) -> Result<(), SessionError> {
        self.map_mut(index)?.map_name = map_name;
        Ok(())
    }

    pub fn set_map_status(&mut self, index: usize, status: MatchStatus) -> Result<(), SessionError> {
        self.map_mut(index)?.status = status;
        Ok(())
    }

    pub fn set_stat(
        &mut self,
        index: usize,
        player_id: Uuid,
        kills: u32,
        deaths: u32,
        assists: u32,
    ) -> Result<(), SessionError> {
        let line = self
            .map_mut(index)?
            .stats
            .iter_mut()
            .map(Tracked::row_mut)
            .find(|line| line.player_id == player_id)
            .ok_or(SessionError::UnknownPlayer(player_id))?;
        line.kills = kills;
        line.deaths = deaths;
        line.assists = assists;
        Ok(())
    }

    /// Change the team selection. Winners are derived at plan time, so nothing else moves.
    pub fn set_teams(&mut self, team1_id: Uuid, team2_id: Uuid) -> Result<(), SessionError> {
        let draft = self.editable()?;
        draft.team1_id = team1_id;
        draft.team2_id = team2_id;
        Ok(())
    }

    pub fn set_status(&mut self, status: MatchStatus) -> Result<(), SessionError> {
        self.editable()?.status = status;
        Ok(())
    }

    pub fn score_preview(&self) -> Option<ScorePair> {
        self.draft.as_ref().map(score_preview)
    }

    /// Plan without executing.
    pub fn preview(&self, rosters: &RosterSizes) -> Result<ReconcilePlan, SessionError> {
        let draft = self.draft.as_ref().ok_or(SessionError::NoDraft)?;
        Ok(plan(draft, rosters)?)
    }

    /// Validate, plan and run the draft against `gateway`.
    ///
    /// Validation failures leave the session in `Editing` with nothing written.
    /// A store failure moves it to `Failed` with the draft intact.
    pub async fn submit(
        &mut self,
        gateway: &dyn PersistenceGateway,
        rosters: &RosterSizes,
    ) -> Result<SubmissionOutcome, SessionError> {
        let planned = {
            let draft = self.editable()?;
            plan(draft, rosters)?
        };

        self.state = SessionState::Submitting;
        match execute(&planned, gateway).await {
            Ok(outcome) => {
                self.state = SessionState::Committed;
                self.draft = None;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Match {} submission failed: {}", planned.match_id, e);
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }
}
