use flashset_core::model::{Card, CardId, CardSetId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{CardSetSummary, StoreError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StoreError {
    StoreError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StoreError> {
    u64::try_from(v).map_err(|_| StoreError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn set_id_from_i64(v: i64) -> Result<CardSetId, StoreError> {
    Ok(CardSetId::new(i64_to_u64("set_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<CardId, StoreError> {
    Ok(CardId::new(i64_to_u64("card_id", v)?))
}

pub(crate) fn set_id_to_i64(id: CardSetId) -> Result<i64, StoreError> {
    i64::try_from(id.value()).map_err(|_| StoreError::Serialization("set_id overflow".into()))
}

pub(crate) fn card_id_to_i64(id: CardId) -> Result<i64, StoreError> {
    i64::try_from(id.value()).map_err(|_| StoreError::Serialization("card_id overflow".into()))
}

pub(crate) fn progress_from_i64(v: i64) -> Result<u8, StoreError> {
    u8::try_from(v)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| StoreError::Serialization(format!("invalid progress_percent: {v}")))
}

pub(crate) fn map_card_row(row: &SqliteRow) -> Result<Card, StoreError> {
    let learned: i64 = row.try_get("is_learned").map_err(ser)?;
    Ok(Card::new(
        card_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("question").map_err(ser)?,
        row.try_get::<String, _>("answer").map_err(ser)?,
        learned != 0,
    ))
}

pub(crate) fn map_summary_row(row: &SqliteRow) -> Result<CardSetSummary, StoreError> {
    let card_count: i64 = row.try_get("card_count").map_err(ser)?;
    Ok(CardSetSummary {
        id: set_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        progress_percent: progress_from_i64(row.try_get("progress_percent").map_err(ser)?)?,
        card_count: u32::try_from(card_count)
            .map_err(|_| StoreError::Serialization(format!("invalid card_count: {card_count}")))?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
