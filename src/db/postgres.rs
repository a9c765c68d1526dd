//! Postgres-backed gateway.
//!
//! Rows are exchanged with Postgres as `jsonb`: reads go through `to_jsonb`,
//! writes through `jsonb_populate_record(set)`, so one set of statements serves
//! every entity. Table and column names come only from the [`Entity`]
//! whitelist, values are always bound.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::gateway::{Condition, Entity, Filter, GatewayError, Order, PersistenceGateway};

#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn order_clause(entity: Entity, order: &Order) -> Result<String, GatewayError> {
    order.validate(entity)?;
    let keys: Vec<String> = order
        .keys()
        .map(|(column, ascending)| format!("t.{} {}", column, if ascending { "ASC" } else { "DESC" }))
        .collect();
    Ok(format!(" ORDER BY {}", keys.join(", ")))
}

/// Builds the WHERE clause and the values to bind, in placeholder order.
fn where_clause(entity: Entity, filter: &Filter) -> Result<(String, Vec<Value>), GatewayError> {
    filter.validate(entity)?;

    let mut parts = Vec::new();
    let mut binds = Vec::new();
    for (column, condition) in &filter.clauses {
        match condition {
            Condition::IsNull | Condition::Eq(Value::Null) => {
                parts.push(format!("t.{column} IS NULL"));
            }
            Condition::Eq(value) => {
                binds.push(value.clone());
                parts.push(format!("to_jsonb(t.{column}) = ${}::jsonb", binds.len()));
            }
            Condition::In(values) if values.is_empty() => {
                parts.push("FALSE".to_string());
            }
            Condition::In(values) => {
                binds.push(Value::Array(values.clone()));
                parts.push(format!(
                    "${}::jsonb @> jsonb_build_array(to_jsonb(t.{column}))",
                    binds.len()
                ));
            }
        }
    }

    let clause = if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    };
    Ok((clause, binds))
}

fn as_object(entity: Entity, row: Value) -> Result<Map<String, Value>, GatewayError> {
    match row {
        Value::Object(map) => {
            for column in map.keys() {
                entity.check_column(column)?;
            }
            Ok(map)
        }
        other => Err(GatewayError::InvalidRow {
            entity,
            detail: format!("expected a JSON object, got {other}"),
        }),
    }
}

fn map_db_error(entity: Entity, error: sqlx::Error) -> GatewayError {
    if let sqlx::Error::Database(db_error) = &error {
        // unique_violation, foreign_key_violation, check_violation
        if matches!(db_error.code().as_deref(), Some("23505" | "23503" | "23514")) {
            return GatewayError::Constraint {
                entity,
                detail: db_error.message().to_string(),
            };
        }
    }
    GatewayError::Database(error)
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    #[tracing::instrument(name = "Gateway select", skip(self, filter, order), fields(entity = %entity))]
    async fn select(
        &self,
        entity: Entity,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, GatewayError> {
        let (clause, binds) = where_clause(entity, filter)?;
        let mut sql = format!("SELECT to_jsonb(t) FROM {} t{}", entity.table(), clause);
        if let Some(order) = order {
            sql.push_str(&order_clause(entity, order)?);
        }

        let mut query = sqlx::query_scalar::<_, Json<Value>>(&sql);
        for value in binds {
            query = query.bind(Json(value));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(entity, e))?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    #[tracing::instrument(name = "Gateway insert", skip(self, rows), fields(entity = %entity, rows = rows.len()))]
    async fn insert(&self, entity: Entity, rows: Vec<Value>) -> Result<Vec<Value>, GatewayError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let now = serde_json::to_value(Utc::now())?;
        let mut submitted_ids = Vec::with_capacity(rows.len());
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = as_object(entity, row)?;
            let id = match row.get("id").and_then(Value::as_str) {
                Some(id) => Uuid::parse_str(id).map_err(|e| GatewayError::InvalidRow {
                    entity,
                    detail: e.to_string(),
                })?,
                None => Uuid::new_v4(),
            };
            row.insert("id".to_string(), Value::String(id.to_string()));
            if entity.has_column("created_at") && !row.contains_key("created_at") {
                row.insert("created_at".to_string(), now.clone());
            }
            submitted_ids.push(id);
            prepared.push(Value::Object(row));
        }

        let table = entity.table();
        let sql = format!(
            "INSERT INTO {table} SELECT * FROM jsonb_populate_recordset(NULL::{table}, $1) \
             RETURNING to_jsonb({table}.*)"
        );
        let returned = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(Value::Array(prepared)))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(entity, e))?;

        // RETURNING order is not guaranteed, restore submission order
        let mut by_id: HashMap<Uuid, Value> = HashMap::with_capacity(returned.len());
        for Json(row) in returned {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| GatewayError::InvalidRow {
                    entity,
                    detail: "returned row without id".to_string(),
                })?;
            by_id.insert(id, row);
        }

        submitted_ids
            .into_iter()
            .map(|id| {
                by_id.remove(&id).ok_or_else(|| GatewayError::InvalidRow {
                    entity,
                    detail: format!("inserted row {id} missing from result"),
                })
            })
            .collect()
    }

    #[tracing::instrument(name = "Gateway update", skip(self, patch), fields(entity = %entity, id = %id))]
    async fn update(&self, entity: Entity, id: Uuid, patch: Value) -> Result<(), GatewayError> {
        let patch = as_object(entity, patch)?;
        let columns: Vec<&String> = patch.keys().filter(|c| c.as_str() != "id").collect();
        if columns.is_empty() {
            return Err(GatewayError::InvalidRow {
                entity,
                detail: "empty patch".to_string(),
            });
        }

        let table = entity.table();
        let assignments = columns
            .iter()
            .map(|c| format!("{c} = p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS p WHERE t.id = $2"
        );

        let result = sqlx::query(&sql)
            .bind(Json(Value::Object(patch)))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(entity, e))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound { entity, id });
        }
        Ok(())
    }

    #[tracing::instrument(name = "Gateway delete", skip(self), fields(entity = %entity, id = %id))]
    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", entity.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(entity, e))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound { entity, id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_binds_values_in_placeholder_order() {
        let id = Uuid::new_v4();
        let filter = Filter::all()
            .eq("match_id", id)
            .one_of("map_number", [1, 2])
            .is_null("winner_id");
        let (clause, binds) = where_clause(Entity::MatchMaps, &filter).unwrap();
        assert_eq!(
            clause,
            " WHERE to_jsonb(t.match_id) = $1::jsonb AND $2::jsonb @> jsonb_build_array(to_jsonb(t.map_number)) AND t.winner_id IS NULL"
        );
        assert_eq!(binds, vec![Value::String(id.to_string()), serde_json::json!([1, 2])]);
    }

    #[test]
    fn where_clause_rejects_unknown_columns() {
        let filter = Filter::all().eq("password", "x");
        assert!(matches!(
            where_clause(Entity::Teams, &filter),
            Err(GatewayError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn order_clause_appends_tiebreak() {
        let order = Order::desc("created_at").then("id");
        assert_eq!(
            order_clause(Entity::Players, &order).unwrap(),
            " ORDER BY t.created_at DESC, t.id ASC"
        );
        assert!(matches!(
            order_clause(Entity::Players, &Order::asc("name").then("secret")),
            Err(GatewayError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let filter = Filter::all().one_of::<Uuid>("id", Vec::new());
        let (clause, binds) = where_clause(Entity::Players, &filter).unwrap();
        assert_eq!(clause, " WHERE FALSE");
        assert!(binds.is_empty());
    }
}
