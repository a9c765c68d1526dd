use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::gateway::{find_record, select_records, Filter, GatewayError, Order, PersistenceGateway};
use crate::models::common::MatchStatus;
use crate::models::match_map::MatchMap;
use crate::models::matches::{MapDetail, Match, MatchDetail};
use crate::models::player::Player;
use crate::models::player_stat::PlayerStat;
use crate::models::team::Team;
use crate::reconcile::RosterSizes;

/// Read-side queries shared by the admin editor and the public views
#[derive(Clone)]
pub struct TournamentQueries {
    gateway: Arc<dyn PersistenceGateway>,
}

impl TournamentQueries {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, GatewayError> {
        find_record(self.gateway(), team_id).await
    }

    pub async fn get_teams(&self) -> Result<Vec<Team>, GatewayError> {
        select_records(self.gateway(), &Filter::all(), Some(&Order::asc("name"))).await
    }

    pub async fn get_teams_by_ids(&self, team_ids: &[Uuid]) -> Result<Vec<Team>, GatewayError> {
        select_records(self.gateway(), &Filter::all().one_of("id", team_ids), None).await
    }

    pub async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, GatewayError> {
        find_record(self.gateway(), player_id).await
    }

    pub async fn get_players(&self) -> Result<Vec<Player>, GatewayError> {
        select_records(self.gateway(), &Filter::all(), Some(&Order::asc("name"))).await
    }

    /// Current roster in signing order; players signed in one batch are ordered by name
    pub async fn get_roster(&self, team_id: Uuid) -> Result<Vec<Player>, GatewayError> {
        select_records(
            self.gateway(),
            &Filter::all().eq("team_id", team_id),
            Some(&Order::asc("created_at").then("name")),
        )
        .await
    }

    /// Roster size of every requested team, zero for teams without players
    pub async fn get_roster_sizes(&self, team_ids: &[Uuid]) -> Result<RosterSizes, GatewayError> {
        let players: Vec<Player> =
            select_records(self.gateway(), &Filter::all().one_of("team_id", team_ids), None).await?;

        let mut sizes: RosterSizes = team_ids.iter().map(|id| (*id, 0)).collect();
        for team_id in players.iter().filter_map(|p| p.team_id) {
            *sizes.entry(team_id).or_insert(0) += 1;
        }
        Ok(sizes)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, GatewayError> {
        find_record(self.gateway(), match_id).await
    }

    /// Matches ordered by schedule, optionally narrowed to a status and/or a team
    pub async fn get_matches(
        &self,
        status: Option<MatchStatus>,
        team_id: Option<Uuid>,
    ) -> Result<Vec<Match>, GatewayError> {
        let filter = match status {
            Some(status) => Filter::all().eq("status", status),
            None => Filter::all(),
        };
        let matches: Vec<Match> =
            select_records(self.gateway(), &filter, Some(&Order::asc("scheduled_at"))).await?;

        Ok(match team_id {
            Some(team_id) => matches.into_iter().filter(|m| m.involves(team_id)).collect(),
            None => matches,
        })
    }

    /// Maps of a match in play order
    pub async fn get_match_maps(&self, match_id: Uuid) -> Result<Vec<MatchMap>, GatewayError> {
        select_records(
            self.gateway(),
            &Filter::all().eq("match_id", match_id),
            Some(&Order::asc("map_number")),
        )
        .await
    }

    pub async fn get_maps_for_matches(&self, match_ids: &[Uuid]) -> Result<Vec<MatchMap>, GatewayError> {
        select_records(self.gateway(), &Filter::all().one_of("match_id", match_ids), None).await
    }

    pub async fn get_stats_for_maps(&self, map_ids: &[Uuid]) -> Result<Vec<PlayerStat>, GatewayError> {
        select_records(self.gateway(), &Filter::all().one_of("map_id", map_ids), None).await
    }

    pub async fn get_all_stats(&self) -> Result<Vec<PlayerStat>, GatewayError> {
        select_records(self.gateway(), &Filter::all(), None).await
    }

    pub async fn get_player_stats(&self, player_id: Uuid) -> Result<Vec<PlayerStat>, GatewayError> {
        select_records(self.gateway(), &Filter::all().eq("player_id", player_id), None).await
    }

    /// Match with both teams, its maps and every stat row per map
    pub async fn get_match_detail(&self, match_id: Uuid) -> Result<Option<MatchDetail>, GatewayError> {
        let Some(match_row) = self.get_match(match_id).await? else {
            return Ok(None);
        };

        let teams = self
            .get_teams_by_ids(&[match_row.team1_id, match_row.team2_id])
            .await?;
        let team = |id: Uuid| teams.iter().find(|t| t.id == id).cloned();

        let maps = self.get_match_maps(match_id).await?;
        let map_ids: Vec<Uuid> = maps.iter().map(|m| m.id).collect();
        let mut stats_by_map: HashMap<Uuid, Vec<PlayerStat>> = HashMap::new();
        for stat in self.get_stats_for_maps(&map_ids).await? {
            stats_by_map.entry(stat.map_id).or_default().push(stat);
        }

        let maps = maps
            .into_iter()
            .map(|map| {
                let mut stats = stats_by_map.remove(&map.id).unwrap_or_default();
                stats.sort_by(|a, b| a.team_id.cmp(&b.team_id).then(b.kills.cmp(&a.kills)));
                MapDetail { map, stats }
            })
            .collect();

        Ok(Some(MatchDetail {
            team1: team(match_row.team1_id),
            team2: team(match_row.team2_id),
            match_row,
            maps,
        }))
    }
}
