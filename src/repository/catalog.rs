use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::availability::{OwnerBlock, PropertyRules};

/// Catalog row. The catalog is administered elsewhere; the booking core
/// only ever reads it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub name: String,
    pub base_price_cents: i64,
    pub cleaning_fee_cents: i64,
    pub deposit_cents: i64,
    pub min_nights: i32,
    pub max_nights: i32,
    pub max_guests: i32,
    pub is_active: bool,
}

impl PropertyRow {
    pub fn rules(&self) -> PropertyRules {
        PropertyRules {
            min_nights: self.min_nights,
            max_nights: self.max_nights,
            max_guests: self.max_guests,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlockedDateRow {
    pub id: Uuid,
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub block_type: String,
    pub reason: Option<String>,
}

impl BlockedDateRow {
    pub fn as_owner_block(&self) -> OwnerBlock {
        OwnerBlock {
            id: self.id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

pub async fn get_property(
    executor: impl PgExecutor<'_>,
    property_id: Uuid,
) -> sqlx::Result<Option<PropertyRow>> {
    sqlx::query_as::<_, PropertyRow>(
        "SELECT id, name, base_price_cents, cleaning_fee_cents, deposit_cents,
                min_nights, max_nights, max_guests, is_active
         FROM properties WHERE id = $1",
    )
    .bind(property_id)
    .fetch_optional(executor)
    .await
}

/// Row lock on the property, serializing concurrent booking attempts
/// for the same property inside their transactions.
pub async fn lock_property(
    executor: impl PgExecutor<'_>,
    property_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query("SELECT id FROM properties WHERE id = $1 FOR UPDATE")
        .bind(property_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list_blocks(
    executor: impl PgExecutor<'_>,
    property_id: Uuid,
) -> sqlx::Result<Vec<BlockedDateRow>> {
    sqlx::query_as::<_, BlockedDateRow>(
        "SELECT id, property_id, start_date, end_date, block_type, reason
         FROM blocked_dates WHERE property_id = $1
         ORDER BY start_date",
    )
    .bind(property_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_block(
    executor: impl PgExecutor<'_>,
    property_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    block_type: &str,
    reason: Option<&str>,
) -> sqlx::Result<BlockedDateRow> {
    sqlx::query_as::<_, BlockedDateRow>(
        "INSERT INTO blocked_dates (property_id, start_date, end_date, block_type, reason)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, property_id, start_date, end_date, block_type, reason",
    )
    .bind(property_id)
    .bind(start_date)
    .bind(end_date)
    .bind(block_type)
    .bind(reason)
    .fetch_one(executor)
    .await
}

pub async fn delete_block(executor: impl PgExecutor<'_>, block_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM blocked_dates WHERE id = $1")
        .bind(block_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
