//! In-process gateway.
//!
//! Holds every entity as a vector of JSON rows behind a mutex and enforces the
//! same keys as the Postgres schema in `migrations/`: unique map numbers per
//! match, one stat row per (map, player), foreign keys with cascade /
//! restrict / set-null deletes. It also keeps a log of every successful
//! operation and can be told to fail the next matching operation, which is how
//! the submission pipeline's abort behaviour is exercised.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::db::gateway::{Condition, Entity, Filter, GatewayError, Order, PersistenceGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub operation: Operation,
    pub entity: Entity,
    /// Rows returned, inserted or touched
    pub rows: usize,
    pub id: Option<Uuid>,
    pub patch: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
enum OnDelete {
    Cascade,
    Restrict,
    SetNull,
}

struct ForeignKey {
    entity: Entity,
    column: &'static str,
    target: Entity,
    on_delete: OnDelete,
}

const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey { entity: Entity::Players, column: "team_id", target: Entity::Teams, on_delete: OnDelete::SetNull },
    ForeignKey { entity: Entity::Matches, column: "team1_id", target: Entity::Teams, on_delete: OnDelete::Restrict },
    ForeignKey { entity: Entity::Matches, column: "team2_id", target: Entity::Teams, on_delete: OnDelete::Restrict },
    ForeignKey { entity: Entity::MatchMaps, column: "match_id", target: Entity::Matches, on_delete: OnDelete::Cascade },
    ForeignKey { entity: Entity::MatchMaps, column: "winner_id", target: Entity::Teams, on_delete: OnDelete::SetNull },
    ForeignKey { entity: Entity::MapPlayerStats, column: "map_id", target: Entity::MatchMaps, on_delete: OnDelete::Cascade },
    ForeignKey { entity: Entity::MapPlayerStats, column: "player_id", target: Entity::Players, on_delete: OnDelete::Cascade },
    ForeignKey { entity: Entity::MapPlayerStats, column: "team_id", target: Entity::Teams, on_delete: OnDelete::Restrict },
];

fn unique_keys(entity: Entity) -> &'static [&'static str] {
    match entity {
        Entity::MatchMaps => &["match_id", "map_number"],
        Entity::MapPlayerStats => &["map_id", "player_id"],
        _ => &[],
    }
}

const NON_NEGATIVE: &[&str] = &[
    "team1_score",
    "team2_score",
    "map_count",
    "map_number",
    "kills",
    "deaths",
    "assists",
];

type Row = Map<String, Value>;

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Entity, Vec<Row>>,
    log: Vec<OperationRecord>,
    failures: Vec<(Operation, Entity)>,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Unavailable("memory store poisoned".to_string()))
    }

    /// Make the next `operation` on `entity` fail with [`GatewayError::Unavailable`].
    pub fn fail_next(&self, operation: Operation, entity: Entity) {
        if let Ok(mut state) = self.lock() {
            state.failures.push((operation, entity));
        }
    }

    /// Successful operations since creation or the last [`Self::clear_log`].
    pub fn operations(&self) -> Vec<OperationRecord> {
        self.lock().map(|s| s.log.clone()).unwrap_or_default()
    }

    /// Like [`Self::operations`] without the reads.
    pub fn writes(&self) -> Vec<OperationRecord> {
        self.operations()
            .into_iter()
            .filter(|op| op.operation != Operation::Select)
            .collect()
    }

    pub fn clear_log(&self) {
        if let Ok(mut state) = self.lock() {
            state.log.clear();
        }
    }

    /// Snapshot of a whole table.
    pub fn rows(&self, entity: Entity) -> Vec<Value> {
        self.lock()
            .map(|s| {
                s.tables
                    .get(&entity)
                    .map(|rows| rows.iter().cloned().map(Value::Object).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

impl MemoryState {
    fn take_failure(&mut self, operation: Operation, entity: Entity) -> Result<(), GatewayError> {
        if let Some(pos) = self
            .failures
            .iter()
            .position(|f| *f == (operation, entity))
        {
            self.failures.remove(pos);
            return Err(GatewayError::Unavailable(format!(
                "{operation:?} on {entity} rejected"
            )));
        }
        Ok(())
    }

    fn table(&self, entity: Entity) -> &[Row] {
        self.tables.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn exists(&self, entity: Entity, id: &Value) -> bool {
        self.table(entity).iter().any(|row| row.get("id") == Some(id))
    }

    /// Checks value ranges, foreign keys and unique keys of `row` against the
    /// table plus `pending` rows of the same batch. `skip_id` excludes the row
    /// being updated from the unique check.
    fn check_row(
        &self,
        entity: Entity,
        row: &Row,
        pending: &[Row],
        skip_id: Option<&Value>,
    ) -> Result<(), GatewayError> {
        for column in NON_NEGATIVE {
            if let Some(value) = row.get(*column) {
                if !value.is_null() && value.as_u64().is_none() {
                    return Err(GatewayError::Constraint {
                        entity,
                        detail: format!("{column} must be a non-negative integer"),
                    });
                }
            }
        }

        for fk in FOREIGN_KEYS.iter().filter(|fk| fk.entity == entity) {
            let value = row.get(fk.column).unwrap_or(&Value::Null);
            if !value.is_null() && !self.exists(fk.target, value) {
                return Err(GatewayError::Constraint {
                    entity,
                    detail: format!("{} references missing {} row {}", fk.column, fk.target, value),
                });
            }
        }

        let keys = unique_keys(entity);
        if !keys.is_empty() {
            let same_key = |other: &Row| keys.iter().all(|k| other.get(*k) == row.get(*k));
            let clash = self
                .table(entity)
                .iter()
                .filter(|other| skip_id.is_none() || other.get("id") != skip_id)
                .chain(pending.iter())
                .any(same_key);
            if clash {
                return Err(GatewayError::Constraint {
                    entity,
                    detail: format!("duplicate key ({})", keys.join(", ")),
                });
            }
        }
        Ok(())
    }

    /// Applies the delete rules of every table pointing at `entity`/`id`.
    fn delete_cascading(&mut self, entity: Entity, id: &Value) -> Result<(), GatewayError> {
        for fk in FOREIGN_KEYS.iter().filter(|fk| fk.target == entity) {
            let referencing: Vec<Value> = self
                .table(fk.entity)
                .iter()
                .filter(|row| row.get(fk.column) == Some(id))
                .filter_map(|row| row.get("id").cloned())
                .collect();
            if referencing.is_empty() {
                continue;
            }
            match fk.on_delete {
                OnDelete::Restrict => {
                    return Err(GatewayError::Constraint {
                        entity,
                        detail: format!("still referenced by {}.{}", fk.entity, fk.column),
                    });
                }
                OnDelete::SetNull => {
                    if let Some(rows) = self.tables.get_mut(&fk.entity) {
                        rows.iter_mut()
                            .filter(|row| row.get(fk.column) == Some(id))
                            .for_each(|row| {
                                row.insert(fk.column.to_string(), Value::Null);
                            });
                    }
                }
                OnDelete::Cascade => {
                    for child in referencing {
                        self.delete_cascading(fk.entity, &child)?;
                    }
                }
            }
        }

        if let Some(rows) = self.tables.get_mut(&entity) {
            rows.retain(|row| row.get("id") != Some(id));
        }
        Ok(())
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    filter.clauses.iter().all(|(column, condition)| {
        let value = row.get(column).unwrap_or(&Value::Null);
        match condition {
            Condition::Eq(expected) => value == expected,
            Condition::In(expected) => expected.contains(value),
            Condition::IsNull => value.is_null(),
        }
    })
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn into_row(entity: Entity, value: Value) -> Result<Row, GatewayError> {
    match value {
        Value::Object(row) => {
            for column in row.keys() {
                entity.check_column(column)?;
            }
            Ok(row)
        }
        other => Err(GatewayError::InvalidRow {
            entity,
            detail: format!("expected a JSON object, got {other}"),
        }),
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn select(
        &self,
        entity: Entity,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, GatewayError> {
        filter.validate(entity)?;
        if let Some(order) = order {
            order.validate(entity)?;
        }

        let mut state = self.lock()?;
        state.take_failure(Operation::Select, entity)?;

        let mut rows: Vec<Row> = state
            .table(entity)
            .iter()
            .filter(|row| matches_filter(row, filter))
            .cloned()
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                order.keys().fold(Ordering::Equal, |ordering, (column, ascending)| {
                    ordering.then_with(|| {
                        let key = compare_values(
                            a.get(column).unwrap_or(&Value::Null),
                            b.get(column).unwrap_or(&Value::Null),
                        );
                        if ascending { key } else { key.reverse() }
                    })
                })
            });
        }

        state.log.push(OperationRecord {
            operation: Operation::Select,
            entity,
            rows: rows.len(),
            id: None,
            patch: None,
        });
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, entity: Entity, rows: Vec<Value>) -> Result<Vec<Value>, GatewayError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::Insert, entity)?;

        // One timestamp per batch keeps creation order stable under sorting
        let now = serde_json::to_value(Utc::now())?;
        let mut prepared: Vec<Row> = Vec::with_capacity(rows.len());
        for value in rows {
            let mut row = into_row(entity, value)?;
            for column in entity.columns() {
                row.entry(column.to_string()).or_insert(Value::Null);
            }
            if row.get("id").map_or(true, Value::is_null) {
                row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            if entity.has_column("created_at") && row.get("created_at").map_or(true, Value::is_null) {
                row.insert("created_at".to_string(), now.clone());
            }
            state.check_row(entity, &row, &prepared, None)?;
            prepared.push(row);
        }

        state
            .tables
            .entry(entity)
            .or_default()
            .extend(prepared.iter().cloned());
        state.log.push(OperationRecord {
            operation: Operation::Insert,
            entity,
            rows: prepared.len(),
            id: None,
            patch: None,
        });
        Ok(prepared.into_iter().map(Value::Object).collect())
    }

    async fn update(&self, entity: Entity, id: Uuid, patch: Value) -> Result<(), GatewayError> {
        let patch_row = into_row(entity, patch.clone())?;
        let mut state = self.lock()?;
        state.take_failure(Operation::Update, entity)?;

        let key = Value::String(id.to_string());
        let current = state
            .table(entity)
            .iter()
            .find(|row| row.get("id") == Some(&key))
            .cloned()
            .ok_or(GatewayError::NotFound { entity, id })?;

        let mut updated = current;
        for (column, value) in patch_row {
            if column != "id" {
                updated.insert(column, value);
            }
        }
        state.check_row(entity, &updated, &[], Some(&key))?;

        if let Some(row) = state
            .tables
            .get_mut(&entity)
            .and_then(|rows| rows.iter_mut().find(|row| row.get("id") == Some(&key)))
        {
            *row = updated;
        }
        state.log.push(OperationRecord {
            operation: Operation::Update,
            entity,
            rows: 1,
            id: Some(id),
            patch: Some(patch),
        });
        Ok(())
    }

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::Delete, entity)?;

        let key = Value::String(id.to_string());
        if !state.exists(entity, &key) {
            return Err(GatewayError::NotFound { entity, id });
        }

        // Dry run on a copy so a restrict violation leaves nothing half-deleted
        let mut scratch = MemoryState {
            tables: state.tables.clone(),
            log: Vec::new(),
            failures: Vec::new(),
        };
        scratch.delete_cascading(entity, &key)?;
        state.tables = scratch.tables;

        state.log.push(OperationRecord {
            operation: Operation::Delete,
            entity,
            rows: 1,
            id: Some(id),
            patch: None,
        });
        Ok(())
    }
}
