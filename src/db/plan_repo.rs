use sqlx::SqlitePool;

use crate::models::{DayDraft, ItemDraft, MealDay, MealItem, MealPlan, MealType};

/// Store for the plan -> day -> item aggregate. Deleting a parent issues
/// explicit deletes for its children, innermost first, inside one
/// transaction.
pub struct PlanRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct PlanRow {
    id: i64,
    patient_id: i64,
    title: String,
    notes: Option<String>,
}

#[derive(sqlx::FromRow)]
struct DayRow {
    id: i64,
    plan_id: i64,
    day_index: i64,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    day_id: i64,
    food_id: i64,
    quantity: f64,
    unit: String,
    meal_type: String,
}

impl ItemRow {
    fn into_item(self) -> Result<MealItem, sqlx::Error> {
        let meal_type: MealType = self
            .meal_type
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(MealItem {
            id: self.id,
            day_id: self.day_id,
            food_id: self.food_id,
            quantity: self.quantity,
            unit: self.unit,
            meal_type,
        })
    }
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a plan together with any supplied days and items, all in one
    /// transaction.
    pub async fn create_plan(
        &self,
        patient_id: i64,
        title: &str,
        notes: Option<&str>,
        days: &[DayDraft],
    ) -> Result<MealPlan, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO meal_plans (patient_id, title, notes) VALUES (?, ?, ?)")
            .bind(patient_id)
            .bind(title)
            .bind(notes)
            .execute(&mut *tx)
            .await?;
        let plan_id = result.last_insert_rowid();

        for day in days {
            let day_result = sqlx::query("INSERT INTO meal_days (plan_id, day_index) VALUES (?, ?)")
                .bind(plan_id)
                .bind(day.day_index)
                .execute(&mut *tx)
                .await?;
            let day_id = day_result.last_insert_rowid();

            for item in &day.items {
                sqlx::query(
                    "INSERT INTO meal_items (day_id, food_id, quantity, unit, meal_type) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(day_id)
                .bind(item.food_id)
                .bind(item.quantity)
                .bind(&item.unit)
                .bind(item.meal_type.to_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_plan(plan_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Fetch a fully materialized plan: days ordered by day_index, items
    /// ordered by id.
    pub async fn get_plan(&self, id: i64) -> Result<Option<MealPlan>, sqlx::Error> {
        let row: Option<PlanRow> = sqlx::query_as("SELECT * FROM meal_plans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_plan(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// All plans of a patient, most recent (highest id) first.
    pub async fn list_by_patient(&self, patient_id: i64) -> Result<Vec<MealPlan>, sqlx::Error> {
        let rows: Vec<PlanRow> =
            sqlx::query_as("SELECT * FROM meal_plans WHERE patient_id = ? ORDER BY id DESC")
                .bind(patient_id)
                .fetch_all(&self.pool)
                .await?;

        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            plans.push(self.hydrate_plan(row).await?);
        }
        Ok(plans)
    }

    pub async fn plan_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM meal_plans WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 != 0)
    }

    pub async fn set_header(
        &self,
        id: i64,
        title: &str,
        notes: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE meal_plans SET title = ?, notes = ? WHERE id = ?")
            .bind(title)
            .bind(notes)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a plan and its whole hierarchy. Returns false if no such plan.
    pub async fn delete_plan(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM meal_items WHERE day_id IN (SELECT id FROM meal_days WHERE plan_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM meal_days WHERE plan_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM meal_plans WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_day(
        &self,
        plan_id: i64,
        day_index: i64,
    ) -> Result<Option<MealDay>, sqlx::Error> {
        let row: Option<DayRow> =
            sqlx::query_as("SELECT * FROM meal_days WHERE plan_id = ? AND day_index = ?")
                .bind(plan_id)
                .bind(day_index)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate_day(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_day(&self, day_id: i64) -> Result<Option<MealDay>, sqlx::Error> {
        let row: Option<DayRow> = sqlx::query_as("SELECT * FROM meal_days WHERE id = ?")
            .bind(day_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_day(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Days of a plan, ascending day_index.
    pub async fn list_days(&self, plan_id: i64) -> Result<Vec<MealDay>, sqlx::Error> {
        let rows: Vec<DayRow> =
            sqlx::query_as("SELECT * FROM meal_days WHERE plan_id = ? ORDER BY day_index")
                .bind(plan_id)
                .fetch_all(&self.pool)
                .await?;

        let mut days = Vec::with_capacity(rows.len());
        for row in rows {
            days.push(self.hydrate_day(row).await?);
        }
        Ok(days)
    }

    pub async fn create_day(&self, plan_id: i64, day_index: i64) -> Result<MealDay, sqlx::Error> {
        let result = sqlx::query("INSERT INTO meal_days (plan_id, day_index) VALUES (?, ?)")
            .bind(plan_id)
            .bind(day_index)
            .execute(&self.pool)
            .await?;

        self.get_day(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn set_day_index(&self, day_id: i64, day_index: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE meal_days SET day_index = ? WHERE id = ?")
            .bind(day_index)
            .bind(day_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a day and its items. Returns false if no such day.
    pub async fn delete_day(&self, day_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM meal_items WHERE day_id = ?")
            .bind(day_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM meal_days WHERE id = ?")
            .bind(day_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<Option<MealItem>, sqlx::Error> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM meal_items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ItemRow::into_item).transpose()
    }

    /// Items of a day, ascending id.
    pub async fn list_items(&self, day_id: i64) -> Result<Vec<MealItem>, sqlx::Error> {
        let rows: Vec<ItemRow> =
            sqlx::query_as("SELECT * FROM meal_items WHERE day_id = ? ORDER BY id")
                .bind(day_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    pub async fn create_item(
        &self,
        day_id: i64,
        draft: &ItemDraft,
    ) -> Result<MealItem, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO meal_items (day_id, food_id, quantity, unit, meal_type) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(day_id)
        .bind(draft.food_id)
        .bind(draft.quantity)
        .bind(&draft.unit)
        .bind(draft.meal_type.to_string())
        .execute(&self.pool)
        .await?;

        self.get_item(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Whole-row overwrite of an item's food, quantity, unit and meal type.
    pub async fn update_item(&self, item_id: i64, draft: &ItemDraft) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE meal_items SET food_id = ?, quantity = ?, unit = ?, meal_type = ? WHERE id = ?",
        )
        .bind(draft.food_id)
        .bind(draft.quantity)
        .bind(&draft.unit)
        .bind(draft.meal_type.to_string())
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meal_items WHERE id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hydrate_plan(&self, row: PlanRow) -> Result<MealPlan, sqlx::Error> {
        let days = self.list_days(row.id).await?;
        Ok(MealPlan {
            id: row.id,
            patient_id: row.patient_id,
            title: row.title,
            notes: row.notes,
            days,
        })
    }

    async fn hydrate_day(&self, row: DayRow) -> Result<MealDay, sqlx::Error> {
        let items = self.list_items(row.id).await?;
        Ok(MealDay {
            id: row.id,
            plan_id: row.plan_id,
            day_index: row.day_index,
            items,
        })
    }
}
