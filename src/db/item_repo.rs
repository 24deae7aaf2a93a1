use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{DietItem, MealType};

/// Time-of-day rank for ordering rows by meal. The canonical names do not
/// sort alphabetically into schedule order, so queries spell the rank out.
const MEAL_ORDER: &str = "CASE meal_type \
     WHEN 'breakfast' THEN 1 \
     WHEN 'morning-snack' THEN 2 \
     WHEN 'lunch' THEN 3 \
     WHEN 'afternoon-snack' THEN 4 \
     WHEN 'dinner' THEN 5 \
     WHEN 'evening-snack' THEN 6 \
     ELSE 7 END";

/// Store for the flat diet-item table. Normal deletion only flips the
/// active flag; rows stay around for history.
pub struct DietItemRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DietItemRow {
    id: i64,
    patient_id: i64,
    title: String,
    notes: Option<String>,
    day_of_week: i64,
    meal_type: String,
    food_id: i64,
    food_name: Option<String>,
    quantity: f64,
    unit: String,
    calories: Option<f64>,
    proteins: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
    active: bool,
    created_at: String,
    updated_at: Option<String>,
}

impl DietItemRow {
    fn into_item(self) -> Result<DietItem, sqlx::Error> {
        let meal_type: MealType = self
            .meal_type
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(DietItem {
            id: self.id,
            patient_id: self.patient_id,
            title: self.title,
            notes: self.notes,
            day_of_week: self.day_of_week,
            meal_type,
            food_id: self.food_id,
            food_name: self.food_name,
            quantity: self.quantity,
            unit: self.unit,
            calories: self.calories,
            proteins: self.proteins,
            carbs: self.carbs,
            fats: self.fats,
            active: self.active,
            created_at: parse_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(parse_timestamp),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl DietItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, item: &DietItem) -> Result<DietItem, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO diet_items (patient_id, title, notes, day_of_week, meal_type, food_id,
                                    food_name, quantity, unit, calories, proteins, carbs, fats,
                                    active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.patient_id)
        .bind(&item.title)
        .bind(&item.notes)
        .bind(item.day_of_week)
        .bind(item.meal_type.to_string())
        .bind(item.food_id)
        .bind(&item.food_name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.calories)
        .bind(item.proteins)
        .bind(item.carbs)
        .bind(item.fats)
        .bind(item.active)
        .bind(item.created_at.to_rfc3339())
        .bind(item.updated_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Lookup by id. Does not filter on the active flag, so soft-deleted
    /// rows remain reachable here.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<DietItem>, sqlx::Error> {
        let row: Option<DietItemRow> = sqlx::query_as("SELECT * FROM diet_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(DietItemRow::into_item).transpose()
    }

    /// Active rows of a plan group, ordered by day then meal schedule.
    pub async fn find_plan_items(
        &self,
        patient_id: i64,
        title: &str,
    ) -> Result<Vec<DietItem>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM diet_items WHERE patient_id = ? AND title = ? AND active = 1 \
             ORDER BY day_of_week, {MEAL_ORDER}"
        );
        let rows: Vec<DietItemRow> = sqlx::query_as(&sql)
            .bind(patient_id)
            .bind(title)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DietItemRow::into_item).collect()
    }

    /// Active rows of one day of a plan group, ordered by meal schedule.
    pub async fn find_by_day(
        &self,
        patient_id: i64,
        title: &str,
        day_of_week: i64,
    ) -> Result<Vec<DietItem>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM diet_items WHERE patient_id = ? AND title = ? AND day_of_week = ? \
             AND active = 1 ORDER BY {MEAL_ORDER}"
        );
        let rows: Vec<DietItemRow> = sqlx::query_as(&sql)
            .bind(patient_id)
            .bind(title)
            .bind(day_of_week)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DietItemRow::into_item).collect()
    }

    /// Active rows of one meal across the week, ordered by day.
    pub async fn find_by_meal_type(
        &self,
        patient_id: i64,
        title: &str,
        meal_type: MealType,
    ) -> Result<Vec<DietItem>, sqlx::Error> {
        let rows: Vec<DietItemRow> = sqlx::query_as(
            "SELECT * FROM diet_items WHERE patient_id = ? AND title = ? AND meal_type = ? \
             AND active = 1 ORDER BY day_of_week",
        )
        .bind(patient_id)
        .bind(title)
        .bind(meal_type.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DietItemRow::into_item).collect()
    }

    /// Distinct titles of a patient's active rows, alphabetical.
    pub async fn distinct_titles(&self, patient_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT title FROM diet_items WHERE patient_id = ? AND active = 1 \
             ORDER BY title",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(title,)| title).collect())
    }

    /// Duplicate check: does an active row already match the full tuple?
    pub async fn exists_active(
        &self,
        patient_id: i64,
        title: &str,
        day_of_week: i64,
        meal_type: MealType,
        food_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM diet_items WHERE patient_id = ? AND title = ? \
             AND day_of_week = ? AND meal_type = ? AND food_id = ? AND active = 1)",
        )
        .bind(patient_id)
        .bind(title)
        .bind(day_of_week)
        .bind(meal_type.to_string())
        .bind(food_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 != 0)
    }

    /// Does the patient have any active row under this title?
    pub async fn has_active_title(
        &self,
        patient_id: i64,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM diet_items WHERE patient_id = ? AND title = ? \
             AND active = 1)",
        )
        .bind(patient_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 != 0)
    }

    /// Whole-row write-back of a loaded item.
    pub async fn update(&self, item: &DietItem) -> Result<DietItem, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE diet_items
            SET title = ?, notes = ?, day_of_week = ?, meal_type = ?, food_id = ?,
                food_name = ?, quantity = ?, unit = ?, calories = ?, proteins = ?,
                carbs = ?, fats = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.notes)
        .bind(item.day_of_week)
        .bind(item.meal_type.to_string())
        .bind(item.food_id)
        .bind(&item.food_name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.calories)
        .bind(item.proteins)
        .bind(item.carbs)
        .bind(item.fats)
        .bind(item.active)
        .bind(item.updated_at.map(|dt| dt.to_rfc3339()))
        .bind(item.id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(item.id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Deactivate every row of a plan group, active or not, stamping
    /// updated_at. Returns the number of rows touched.
    pub async fn soft_delete_plan(
        &self,
        patient_id: i64,
        title: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE diet_items SET active = 0, updated_at = ? WHERE patient_id = ? AND title = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(patient_id)
        .bind(title)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert a batch of rows in a single transaction and return them with
    /// their assigned ids.
    pub async fn insert_all(&self, items: &[DietItem]) -> Result<Vec<DietItem>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO diet_items (patient_id, title, notes, day_of_week, meal_type, food_id,
                                        food_name, quantity, unit, calories, proteins, carbs, fats,
                                        active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.patient_id)
            .bind(&item.title)
            .bind(&item.notes)
            .bind(item.day_of_week)
            .bind(item.meal_type.to_string())
            .bind(item.food_id)
            .bind(&item.food_name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.calories)
            .bind(item.proteins)
            .bind(item.carbs)
            .bind(item.fats)
            .bind(item.active)
            .bind(item.created_at.to_rfc3339())
            .bind(item.updated_at.map(|dt| dt.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;

        let mut saved = Vec::with_capacity(ids.len());
        for id in ids {
            saved.push(self.get_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)?);
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: DietItemRepository,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(Some(db_path)).await.unwrap();
        TestContext {
            repo: DietItemRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn item(day: i64, meal: MealType, food: i64) -> DietItem {
        DietItem::new(1, "Plan A", day, meal, food, 100.0, "g")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let created = repo
            .create(
                &item(1, MealType::Breakfast, 10)
                    .with_food_name(Some("Oats".to_string()))
                    .with_nutrition(Some(389.0), Some(16.9), Some(66.3), Some(6.9)),
            )
            .await
            .unwrap();

        assert!(created.id > 0);
        assert!(created.active);
        assert_eq!(created.food_name.as_deref(), Some("Oats"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.calories, Some(389.0));
        assert_eq!(fetched.meal_type, MealType::Breakfast);
    }

    #[tokio::test]
    async fn test_find_plan_items_ordering() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        // Inserted deliberately out of schedule order
        repo.create(&item(2, MealType::Breakfast, 1)).await.unwrap();
        repo.create(&item(1, MealType::Dinner, 2)).await.unwrap();
        repo.create(&item(1, MealType::Breakfast, 3)).await.unwrap();
        repo.create(&item(1, MealType::MorningSnack, 4)).await.unwrap();

        let items = repo.find_plan_items(1, "Plan A").await.unwrap();
        let keys: Vec<(i64, MealType)> =
            items.iter().map(|i| (i.day_of_week, i.meal_type)).collect();
        assert_eq!(
            keys,
            vec![
                (1, MealType::Breakfast),
                (1, MealType::MorningSnack),
                (1, MealType::Dinner),
                (2, MealType::Breakfast),
            ]
        );
    }

    #[tokio::test]
    async fn test_find_by_day_and_meal_type() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.create(&item(1, MealType::Lunch, 1)).await.unwrap();
        repo.create(&item(1, MealType::Breakfast, 2)).await.unwrap();
        repo.create(&item(3, MealType::Lunch, 3)).await.unwrap();

        let monday = repo.find_by_day(1, "Plan A", 1).await.unwrap();
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].meal_type, MealType::Breakfast);
        assert_eq!(monday[1].meal_type, MealType::Lunch);

        let lunches = repo.find_by_meal_type(1, "Plan A", MealType::Lunch).await.unwrap();
        assert_eq!(lunches.len(), 2);
        assert_eq!(lunches[0].day_of_week, 1);
        assert_eq!(lunches[1].day_of_week, 3);
    }

    #[tokio::test]
    async fn test_exists_active_tuple() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.create(&item(1, MealType::Lunch, 42)).await.unwrap();

        assert!(repo
            .exists_active(1, "Plan A", 1, MealType::Lunch, 42)
            .await
            .unwrap());
        assert!(!repo
            .exists_active(1, "Plan A", 2, MealType::Lunch, 42)
            .await
            .unwrap());
        assert!(!repo
            .exists_active(1, "Plan B", 1, MealType::Lunch, 42)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_plan_stamps_rows() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let a = repo.create(&item(1, MealType::Lunch, 1)).await.unwrap();
        let b = repo.create(&item(2, MealType::Dinner, 2)).await.unwrap();

        let touched = repo.soft_delete_plan(1, "Plan A").await.unwrap();
        assert_eq!(touched, 2);

        // Gone from group queries, still reachable by id with the flag down
        assert!(repo.find_plan_items(1, "Plan A").await.unwrap().is_empty());
        let a = repo.get_by_id(a.id).await.unwrap().unwrap();
        let b = repo.get_by_id(b.id).await.unwrap().unwrap();
        assert!(!a.active);
        assert!(!b.active);
        assert!(a.updated_at.is_some());

        // Empty group is a no-op
        assert_eq!(repo.soft_delete_plan(1, "No Such Plan").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_distinct_titles_alphabetical() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.create(&DietItem::new(1, "Winter", 1, MealType::Lunch, 1, 1.0, "g"))
            .await
            .unwrap();
        repo.create(&DietItem::new(1, "Autumn", 1, MealType::Lunch, 2, 1.0, "g"))
            .await
            .unwrap();
        repo.create(&DietItem::new(1, "Autumn", 2, MealType::Lunch, 3, 1.0, "g"))
            .await
            .unwrap();

        let titles = repo.distinct_titles(1).await.unwrap();
        assert_eq!(titles, vec!["Autumn", "Winter"]);
    }

    #[tokio::test]
    async fn test_update_writes_back_row() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let mut created = repo.create(&item(1, MealType::Lunch, 1)).await.unwrap();
        created.quantity = 250.0;
        created.meal_type = MealType::Dinner;
        created.updated_at = Some(Utc::now());

        let updated = repo.update(&created).await.unwrap();
        assert_eq!(updated.quantity, 250.0);
        assert_eq!(updated.meal_type, MealType::Dinner);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_insert_all_assigns_ids() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let batch = vec![
            item(1, MealType::Breakfast, 1),
            item(2, MealType::Lunch, 2),
            item(3, MealType::Dinner, 3),
        ];
        let saved = repo.insert_all(&batch).await.unwrap();

        assert_eq!(saved.len(), 3);
        assert!(saved.iter().all(|i| i.id > 0));
        assert_eq!(repo.find_plan_items(1, "Plan A").await.unwrap().len(), 3);
    }
}
