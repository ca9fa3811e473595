use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::meals::dto::MealChanges;

#[derive(Debug, Clone, FromRow)]
pub struct Meal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub date_time: PrimitiveDateTime,
    pub in_diet: bool,
}

impl Meal {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        date_time: PrimitiveDateTime,
        in_diet: bool,
    ) -> Result<Meal, sqlx::Error> {
        sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (user_id, name, description, date_time, in_diet)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, description, date_time, in_diet
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(date_time)
        .bind(in_diet)
        .fetch_one(db)
        .await
    }

    /// All meals owned by `user_id`; the order is not part of the contract.
    pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<Meal>, sqlx::Error> {
        sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, user_id, name, description, date_time, in_diet
            FROM meals
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// `None` covers both a missing row and a row owned by someone else.
    pub async fn find_owned(
        db: &PgPool,
        user_id: i64,
        meal_id: i64,
    ) -> Result<Option<Meal>, sqlx::Error> {
        sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, user_id, name, description, date_time, in_diet
            FROM meals
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Fetch, merge the supplied fields, store — all in one transaction.
    pub async fn update(
        db: &PgPool,
        user_id: i64,
        meal_id: i64,
        changes: MealChanges,
    ) -> Result<Option<Meal>, sqlx::Error> {
        let mut tx = db.begin().await?;
        let meal = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, user_id, name, description, date_time, in_diet
            FROM meals
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut meal) = meal else {
            return Ok(None);
        };
        meal.apply(changes);

        sqlx::query(
            r#"
            UPDATE meals
            SET name = $3, description = $4, date_time = $5, in_diet = $6
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(meal.id)
        .bind(meal.user_id)
        .bind(&meal.name)
        .bind(&meal.description)
        .bind(meal.date_time)
        .bind(meal.in_diet)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(meal))
    }

    pub async fn delete_owned(
        db: &PgPool,
        user_id: i64,
        meal_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
            .bind(meal_id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite only the fields the caller supplied.
    fn apply(&mut self, changes: MealChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(date_time) = changes.date_time {
            self.date_time = date_time;
        }
        if let Some(in_diet) = changes.in_diet {
            self.in_diet = in_diet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::dto::parse_date_time;

    fn lunch() -> Meal {
        Meal {
            id: 1,
            user_id: 7,
            name: "Lunch".into(),
            description: None,
            date_time: parse_date_time("2024-01-01 12:00:00").unwrap(),
            in_diet: true,
        }
    }

    #[test]
    fn apply_with_only_description_changes_nothing_else() {
        let mut meal = lunch();
        meal.apply(MealChanges {
            description: Some("leftovers".into()),
            ..Default::default()
        });
        assert_eq!(meal.name, "Lunch");
        assert_eq!(meal.description.as_deref(), Some("leftovers"));
        assert_eq!(
            meal.date_time,
            parse_date_time("2024-01-01 12:00:00").unwrap()
        );
        assert!(meal.in_diet);
    }

    #[test]
    fn apply_can_unset_in_diet() {
        let mut meal = lunch();
        meal.apply(MealChanges {
            in_diet: Some(false),
            ..Default::default()
        });
        assert!(!meal.in_diet);
    }

    #[test]
    fn apply_with_no_changes_is_a_no_op() {
        let mut meal = lunch();
        meal.apply(MealChanges::default());
        assert_eq!(meal.name, "Lunch");
        assert!(meal.description.is_none());
        assert!(meal.in_diet);
    }
}
