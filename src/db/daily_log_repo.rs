use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use moodmeal_core::{DailyLog, DailyLogStore, DateKey, MealEntry, StoreError};

/// SQLite-backed daily log store. Rows are unique on `(user_id, date)`.
pub struct DailyLogRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DailyLogRow {
    id: String,
    date: String,
    meals: String,
    total_calories: f64,
    total_carbs: f64,
    total_protein: f64,
    total_fat: f64,
    water_intake: i64,
}

impl DailyLogRow {
    fn into_log(self) -> Result<DailyLog, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Decode(format!("id '{}': {}", self.id, e)))?;
        let date: DateKey = self
            .date
            .parse()
            .map_err(|e: moodmeal_core::DateKeyError| StoreError::Decode(e.to_string()))?;
        let meals: Vec<MealEntry> = serde_json::from_str(&self.meals)
            .map_err(|e| StoreError::Decode(format!("meals for {}: {}", date, e)))?;
        let water_intake = u32::try_from(self.water_intake).map_err(|_| {
            StoreError::Decode(format!("water_intake {} for {}", self.water_intake, date))
        })?;

        Ok(DailyLog {
            id: Some(id),
            date,
            meals,
            total_calories: self.total_calories,
            total_carbs: self.total_carbs,
            total_protein: self.total_protein,
            total_fat: self.total_fat,
            water_intake,
        })
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    let busy = match &e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            let message = db.message();
            message.contains("locked") || message.contains("busy")
        }
        _ => false,
    };
    StoreError::Database {
        message: e.to_string(),
        busy,
    }
}

impl DailyLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: &str, date: DateKey) -> Result<Option<DailyLog>, StoreError> {
        let row: Option<DailyLogRow> = sqlx::query_as(
            "SELECT id, date, meals, total_calories, total_carbs, total_protein, total_fat, water_intake \
             FROM daily_logs WHERE user_id = ? AND date = ?",
        )
        .bind(user_id)
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(DailyLogRow::into_log).transpose()
    }
}

#[async_trait]
impl DailyLogStore for DailyLogRepository {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError> {
        // Keys are zero-padded, so text comparison is calendar order
        let rows: Vec<DailyLogRow> = sqlx::query_as(
            "SELECT id, date, meals, total_calories, total_carbs, total_protein, total_fat, water_intake \
             FROM daily_logs WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )
        .bind(user_id)
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(DailyLogRow::into_log).collect()
    }

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError> {
        let mut log = log.clone();
        log.recompute_totals();

        let id = log.id.unwrap_or_else(Uuid::new_v4).to_string();
        let meals =
            serde_json::to_string(&log.meals).map_err(|e| StoreError::Decode(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // updated_at only moves when the content does, so re-sending a
        // record leaves the row byte-for-byte unchanged
        sqlx::query(
            r#"
            INSERT INTO daily_logs (id, user_id, date, meals, total_calories, total_carbs, total_protein, total_fat, water_intake, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET
                meals = excluded.meals,
                total_calories = excluded.total_calories,
                total_carbs = excluded.total_carbs,
                total_protein = excluded.total_protein,
                total_fat = excluded.total_fat,
                water_intake = excluded.water_intake,
                updated_at = excluded.updated_at
            WHERE daily_logs.meals IS NOT excluded.meals
               OR daily_logs.total_calories IS NOT excluded.total_calories
               OR daily_logs.total_carbs IS NOT excluded.total_carbs
               OR daily_logs.total_protein IS NOT excluded.total_protein
               OR daily_logs.total_fat IS NOT excluded.total_fat
               OR daily_logs.water_intake IS NOT excluded.water_intake
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(log.date.to_string())
        .bind(&meals)
        .bind(log.total_calories)
        .bind(log.total_carbs)
        .bind(log.total_protein)
        .bind(log.total_fat)
        .bind(i64::from(log.water_intake))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::debug!(user_id, date = %log.date, "Upserted daily log");

        self.get(user_id, log.date)
            .await?
            .ok_or_else(|| StoreError::MissingRow(log.date.to_string()))
    }
}
