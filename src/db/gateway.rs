//! Persistence gateway contract.
//!
//! The rest of the crate never talks to a database directly. Every read and
//! write goes through [`PersistenceGateway`], a small CRUD surface over five
//! flat tables. Rows cross the boundary as JSON objects so the same trait can
//! be served by Postgres ([`crate::db::postgres::PgGateway`]) or by the
//! in-process store ([`crate::db::memory::MemoryGateway`]).
//!
//! Typed access goes through [`Record`] and the `*_records` helpers below.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Teams,
    Players,
    Matches,
    MatchMaps,
    MapPlayerStats,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Teams,
        Entity::Players,
        Entity::Matches,
        Entity::MatchMaps,
        Entity::MapPlayerStats,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Entity::Teams => "teams",
            Entity::Players => "players",
            Entity::Matches => "matches",
            Entity::MatchMaps => "match_maps",
            Entity::MapPlayerStats => "map_player_stats",
        }
    }

    /// Column whitelist. Anything else in a filter, order or patch is rejected.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Entity::Teams => &["id", "name", "logo", "logo_url", "created_at"],
            Entity::Players => &["id", "name", "team_id", "role", "avatar", "created_at"],
            Entity::Matches => &[
                "id",
                "team1_id",
                "team2_id",
                "scheduled_at",
                "status",
                "team1_score",
                "team2_score",
                "map_count",
                "created_at",
            ],
            Entity::MatchMaps => &[
                "id",
                "match_id",
                "map_number",
                "map_name",
                "team1_score",
                "team2_score",
                "winner_id",
                "status",
            ],
            Entity::MapPlayerStats => &[
                "id",
                "map_id",
                "player_id",
                "team_id",
                "kills",
                "deaths",
                "assists",
            ],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    pub fn check_column(&self, column: &str) -> Result<(), GatewayError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(GatewayError::UnknownColumn {
                entity: *self,
                column: column.to_string(),
            })
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{entity} row {id} not found")]
    NotFound { entity: Entity, id: Uuid },
    #[error("Unknown column {column} on {entity}")]
    UnknownColumn { entity: Entity, column: String },
    #[error("Constraint violated on {entity}: {detail}")]
    Constraint { entity: Entity, detail: String },
    #[error("Invalid row for {entity}: {detail}")]
    InvalidRow { entity: Entity, detail: String },
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    In(Vec<Value>),
    IsNull,
}

/// Conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.clauses.push((column.to_string(), Condition::Eq(value)));
        self
    }

    pub fn one_of<T: Serialize>(mut self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        let values = values
            .into_iter()
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
            .collect();
        self.clauses.push((column.to_string(), Condition::In(values)));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.clauses.push((column.to_string(), Condition::IsNull));
        self
    }

    pub fn validate(&self, entity: Entity) -> Result<(), GatewayError> {
        self.clauses
            .iter()
            .try_for_each(|(column, _)| entity.check_column(column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
    /// Ascending column that settles ties on `column`
    pub tiebreak: Option<String>,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: true, tiebreak: None }
    }

    pub fn desc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: false, tiebreak: None }
    }

    pub fn then(mut self, column: &str) -> Self {
        self.tiebreak = Some(column.to_string());
        self
    }

    /// Sort keys in priority order with their direction
    pub fn keys(&self) -> impl Iterator<Item = (&str, bool)> {
        std::iter::once((self.column.as_str(), self.ascending))
            .chain(self.tiebreak.as_deref().map(|column| (column, true)))
    }

    pub fn validate(&self, entity: Entity) -> Result<(), GatewayError> {
        self.keys().try_for_each(|(column, _)| entity.check_column(column))
    }
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read matching rows, optionally ordered.
    async fn select(
        &self,
        entity: Entity,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, GatewayError>;

    /// Insert rows and return them with their assigned identities, in submission order.
    async fn insert(&self, entity: Entity, rows: Vec<Value>) -> Result<Vec<Value>, GatewayError>;

    /// Partial update of one row.
    async fn update(&self, entity: Entity, id: Uuid, patch: Value) -> Result<(), GatewayError>;

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError>;
}

/// A persisted row shape bound to one gateway entity.
pub trait Record: Serialize + DeserializeOwned + Send {
    const ENTITY: Entity;
}

pub async fn select_records<R: Record>(
    gateway: &dyn PersistenceGateway,
    filter: &Filter,
    order: Option<&Order>,
) -> Result<Vec<R>, GatewayError> {
    let rows = gateway.select(R::ENTITY, filter, order).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
        .collect()
}

pub async fn find_record<R: Record>(
    gateway: &dyn PersistenceGateway,
    id: Uuid,
) -> Result<Option<R>, GatewayError> {
    let mut rows = select_records::<R>(gateway, &Filter::all().eq("id", id), None).await?;
    Ok(rows.pop())
}

/// Insert payloads (which carry no identity) and decode the stored rows.
pub async fn insert_records<R: Record, P: Serialize>(
    gateway: &dyn PersistenceGateway,
    payloads: &[P],
) -> Result<Vec<R>, GatewayError> {
    let rows = payloads
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let stored = gateway.insert(R::ENTITY, rows).await?;
    if stored.len() != payloads.len() {
        return Err(GatewayError::InvalidRow {
            entity: R::ENTITY,
            detail: format!("submitted {} rows, store returned {}", payloads.len(), stored.len()),
        });
    }
    stored
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
        .collect()
}

pub async fn update_record<P: Serialize>(
    gateway: &dyn PersistenceGateway,
    entity: Entity,
    id: Uuid,
    patch: &P,
) -> Result<(), GatewayError> {
    gateway.update(entity, id, serde_json::to_value(patch)?).await
}
