use flashset_core::model::{Card, CardId, CardSetId};

use super::SqliteRepository;
use super::mapping::{card_id_to_i64, conn, map_card_row, set_id_to_i64};
use crate::repository::{CardRepository, StoreError};

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn load_cards(&self, set_id: CardSetId) -> Result<Vec<Card>, StoreError> {
        let key = set_id_to_i64(set_id)?;

        let exists = sqlx::query("SELECT 1 FROM card_sets WHERE id = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let rows = sqlx::query(
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

        rows.iter().map(map_card_row).collect()
    }

    async fn save_learned_flag(&self, card_id: CardId, learned: bool) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE cards SET is_learned = ?1 WHERE id = ?2")
            .bind(i64::from(learned))
            .bind(card_id_to_i64(card_id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
