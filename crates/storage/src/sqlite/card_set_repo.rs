use chrono::{DateTime, Utc};
use flashset_core::model::{CardSet, CardSetDraft, CardSetId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_card_row, map_summary_row, ser, set_id_from_i64, set_id_to_i64};
use crate::repository::{CardSetRepository, CardSetSummary, StoreError};

#[async_trait::async_trait]
impl CardSetRepository for SqliteRepository {
    async fn create_card_set(
        &self,
        draft: &CardSetDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CardSetId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO card_sets (name, description, source_text, progress_percent, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            ",
        )
        .bind(draft.name.as_str())
        .bind(draft.description.as_str())
        .bind(draft.source_text.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let set_id = set_id_from_i64(res.last_insert_rowid())?;
        let set_key = set_id_to_i64(set_id)?;

        for (position, card) in draft.cards.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StoreError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO cards (set_id, position, question, answer, is_learned)
                VALUES (?1, ?2, ?3, ?4, 0)
                ",
            )
            .bind(set_key)
            .bind(position)
            .bind(card.question.as_str())
            .bind(card.answer.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        tracing::debug!(set_id = %set_id, cards = draft.cards.len(), "stored card set");
        Ok(set_id)
    }

    async fn get_card_set(&self, id: CardSetId) -> Result<Option<CardSet>, StoreError> {
        let key = set_id_to_i64(id)?;
        let Some(row) = sqlx::query(
            r"
            SELECT name, description, source_text, created_at
            FROM card_sets
            WHERE id = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let card_rows = sqlx::query(
            r"
            SELECT id, question, answer, is_learned
            FROM cards
            WHERE set_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        let cards = card_rows
            .iter()
            .map(map_card_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CardSet::new(
            id,
            row.try_get::<String, _>("name").map_err(ser)?,
            row.try_get::<String, _>("description").map_err(ser)?,
            row.try_get::<String, _>("source_text").map_err(ser)?,
            cards,
            row.try_get("created_at").map_err(ser)?,
        )))
    }

    async fn list_card_sets(&self, limit: u32) -> Result<Vec<CardSetSummary>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT
                s.id, s.name, s.description, s.progress_percent, s.created_at,
                COUNT(c.id) AS card_count
            FROM card_sets s
            LEFT JOIN cards c ON c.set_id = s.id
            GROUP BY s.id
            ORDER BY s.id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row).collect()
    }

    async fn save_progress(&self, id: CardSetId, percent: u8) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE card_sets SET progress_percent = ?1 WHERE id = ?2")
            .bind(i64::from(percent.min(100)))
            .bind(set_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_card_set(&self, id: CardSetId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM card_sets WHERE id = ?1")
            .bind(set_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
