use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Part {
    pub id: Uuid,
    pub part_number: String,
    pub description: String,
    pub manufacturer: Option<String>,
    pub unit_cost_cents: i64,
    pub unit_price_cents: i64,
    pub quantity_on_hand: i32,
    pub quantity_reserved: i32,
}

impl Part {
    /// On-hand stock minus reservations. Over-reservation shows as zero
    /// rather than a negative count.
    pub fn quantity_available(&self) -> i32 {
        (self.quantity_on_hand - self.quantity_reserved).max(0)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(
            r#"
            SELECT id, part_number, description, manufacturer,
                   unit_cost_cents, unit_price_cents, quantity_on_hand, quantity_reserved
            FROM parts
            ORDER BY part_number ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(
            r#"
            SELECT id, part_number, description, manufacturer,
                   unit_cost_cents, unit_price_cents, quantity_on_hand, quantity_reserved
            FROM parts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(on_hand: i32, reserved: i32) -> Part {
        Part {
            id: Uuid::new_v4(),
            part_number: "FLT-100".into(),
            description: "Oil filter".into(),
            manufacturer: None,
            unit_cost_cents: 450,
            unit_price_cents: 1200,
            quantity_on_hand: on_hand,
            quantity_reserved: reserved,
        }
    }

    #[test]
    fn available_is_on_hand_minus_reserved() {
        assert_eq!(part(10, 3).quantity_available(), 7);
    }

    #[test]
    fn over_reservation_clamps_to_zero() {
        assert_eq!(part(2, 5).quantity_available(), 0);
    }
}
