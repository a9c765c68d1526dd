use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::gateway::GatewayError;
use crate::db::tournament_queries::TournamentQueries;
use crate::models::common::{kd_ratio, MatchStatus};
use crate::models::match_map::MatchMap;
use crate::models::matches::Match;
use crate::models::player::{Player, PlayerCareer};
use crate::models::player_stat::PlayerStat;
use crate::models::team::{Team, TeamStanding};

/// Leaderboard over completed matches.
///
/// A completed match counts as a win for the side with the higher aggregate
/// score and a loss for the other; drawn matches count as played only.
/// Rounds are summed from the maps of completed matches. Ordered by wins,
/// then round difference, then name.
pub fn compute_standings(teams: &[Team], matches: &[Match], maps: &[MatchMap]) -> Vec<TeamStanding> {
    let mut table: HashMap<Uuid, TeamStanding> = teams
        .iter()
        .map(|team| {
            (
                team.id,
                TeamStanding {
                    team_id: team.id,
                    team_name: team.name.clone(),
                    logo: team.logo.clone(),
                    logo_url: team.logo_url.clone(),
                    position: 0,
                    matches_played: 0,
                    wins: 0,
                    losses: 0,
                    rounds_won: 0,
                    rounds_lost: 0,
                },
            )
        })
        .collect();

    let completed: HashMap<Uuid, &Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .map(|m| (m.id, m))
        .collect();

    for match_row in completed.values() {
        let winner = match_row.winner();
        for team_id in [match_row.team1_id, match_row.team2_id] {
            if let Some(entry) = table.get_mut(&team_id) {
                entry.matches_played += 1;
                match winner {
                    Some(w) if w == team_id => entry.wins += 1,
                    Some(_) => entry.losses += 1,
                    None => {}
                }
            }
        }
    }

    for map in maps {
        let Some(match_row) = completed.get(&map.match_id) else {
            continue;
        };
        if let Some(entry) = table.get_mut(&match_row.team1_id) {
            entry.rounds_won = entry.rounds_won.saturating_add(map.team1_score);
            entry.rounds_lost = entry.rounds_lost.saturating_add(map.team2_score);
        }
        if let Some(entry) = table.get_mut(&match_row.team2_id) {
            entry.rounds_won = entry.rounds_won.saturating_add(map.team2_score);
            entry.rounds_lost = entry.rounds_lost.saturating_add(map.team1_score);
        }
    }

    let mut standings: Vec<TeamStanding> = table.into_values().collect();
    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.round_difference().cmp(&a.round_difference()))
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    for (index, standing) in standings.iter_mut().enumerate() {
        standing.position = index as u32 + 1;
    }
    standings
}

/// Career totals per player, ordered by K/D ratio then kills
pub fn player_careers(players: &[Player], stats: &[PlayerStat]) -> Vec<PlayerCareer> {
    let mut by_player: HashMap<Uuid, Vec<&PlayerStat>> = HashMap::new();
    for stat in stats {
        by_player.entry(stat.player_id).or_default().push(stat);
    }

    let mut careers: Vec<PlayerCareer> = players
        .iter()
        .map(|player| {
            let lines = by_player.get(&player.id).map(Vec::as_slice).unwrap_or(&[]);
            let maps: HashSet<Uuid> = lines.iter().map(|s| s.map_id).collect();
            let total = |field: fn(&PlayerStat) -> u32| {
                lines.iter().fold(0u32, |sum, stat| sum.saturating_add(field(stat)))
            };
            let kills = total(|s| s.kills);
            let deaths = total(|s| s.deaths);
            let assists = total(|s| s.assists);
            PlayerCareer {
                player_id: player.id,
                name: player.name.clone(),
                team_id: player.team_id,
                role: player.role.clone(),
                avatar: player.avatar.clone(),
                maps_played: maps.len() as u32,
                kills,
                deaths,
                assists,
                kd_ratio: kd_ratio(kills, deaths),
            }
        })
        .collect();

    careers.sort_by(|a, b| {
        b.kd_ratio
            .partial_cmp(&a.kd_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.kills.cmp(&a.kills))
    });
    careers
}

/// Loads what the public leaderboards need and computes them
pub struct StandingsService {
    queries: TournamentQueries,
}

impl StandingsService {
    pub fn new(queries: TournamentQueries) -> Self {
        Self { queries }
    }

    #[tracing::instrument(name = "Compute standings", skip(self))]
    pub async fn standings(&self) -> Result<Vec<TeamStanding>, GatewayError> {
        let teams = self.queries.get_teams().await?;
        let matches = self
            .queries
            .get_matches(Some(MatchStatus::Completed), None)
            .await?;
        let match_ids: Vec<Uuid> = matches.iter().map(|m| m.id).collect();
        let maps = self.queries.get_maps_for_matches(&match_ids).await?;
        Ok(compute_standings(&teams, &matches, &maps))
    }

    pub async fn team_standing(&self, team_id: Uuid) -> Result<Option<TeamStanding>, GatewayError> {
        Ok(self
            .standings()
            .await?
            .into_iter()
            .find(|s| s.team_id == team_id))
    }

    #[tracing::instrument(name = "Compute player careers", skip(self))]
    pub async fn careers(&self) -> Result<Vec<PlayerCareer>, GatewayError> {
        let players = self.queries.get_players().await?;
        let stats = self.queries.get_all_stats().await?;
        Ok(player_careers(&players, &stats))
    }

    pub async fn career(&self, player_id: Uuid) -> Result<Option<PlayerCareer>, GatewayError> {
        let Some(player) = self.queries.get_player(player_id).await? else {
            return Ok(None);
        };
        let stats = self.queries.get_player_stats(player_id).await?;
        Ok(player_careers(std::slice::from_ref(&player), &stats).pop())
    }
}
