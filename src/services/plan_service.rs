use crate::db::PlanRepository;
use crate::error::DietError;
use crate::models::{DayDraft, ItemDraft, MealDay, MealItem, MealPlan};

/// Operations on the plan -> day -> item aggregate. The caller supplies an
/// already-authorized patient id; no ownership checks happen here.
pub struct PlanCompositionService {
    repo: PlanRepository,
}

impl PlanCompositionService {
    pub fn new(repo: PlanRepository) -> Self {
        Self { repo }
    }

    /// Create a plan, optionally with nested days and items. Duplicate
    /// titles for the same patient are allowed.
    pub async fn create_plan(
        &self,
        patient_id: i64,
        title: &str,
        notes: Option<&str>,
        days: &[DayDraft],
    ) -> Result<MealPlan, DietError> {
        tracing::info!(
            "Creating meal plan '{}' for patient {} with {} day(s)",
            title,
            patient_id,
            days.len()
        );
        Ok(self.repo.create_plan(patient_id, title, notes, days).await?)
    }

    pub async fn get_plan(&self, plan_id: i64) -> Result<MealPlan, DietError> {
        self.repo
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| DietError::NotFound(format!("MealPlan {}", plan_id)))
    }

    /// Plans of a patient, most recent first.
    pub async fn list_plans(&self, patient_id: i64) -> Result<Vec<MealPlan>, DietError> {
        Ok(self.repo.list_by_patient(patient_id).await?)
    }

    /// Update title and notes of the plan header. The title is applied only
    /// when supplied and non-blank; notes are always overwritten with the
    /// supplied value, including overwriting to nothing.
    pub async fn update_header(
        &self,
        plan_id: i64,
        title: Option<String>,
        notes: Option<String>,
    ) -> Result<MealPlan, DietError> {
        let plan = self.get_plan(plan_id).await?;

        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => plan.title,
        };
        self.repo
            .set_header(plan_id, &title, notes.as_deref())
            .await?;

        self.get_plan(plan_id).await
    }

    /// Delete a plan with its days and items. Returns false when no such
    /// plan exists.
    pub async fn delete_plan(&self, plan_id: i64) -> Result<bool, DietError> {
        tracing::info!("Deleting meal plan {}", plan_id);
        Ok(self.repo.delete_plan(plan_id).await?)
    }

    /// Return the plan's day with this index, creating an empty one if it
    /// does not exist yet. Repeated sequential calls never create
    /// duplicates.
    pub async fn add_or_get_day(&self, plan_id: i64, day_index: i64) -> Result<MealDay, DietError> {
        if !self.repo.plan_exists(plan_id).await? {
            return Err(DietError::NotFound(format!("MealPlan {}", plan_id)));
        }

        if let Some(day) = self.repo.find_day(plan_id, day_index).await? {
            return Ok(day);
        }

        tracing::debug!("Creating day {} for plan {}", day_index, plan_id);
        Ok(self.repo.create_day(plan_id, day_index).await?)
    }

    pub async fn get_day(&self, day_id: i64) -> Result<MealDay, DietError> {
        self.repo
            .get_day(day_id)
            .await?
            .ok_or_else(|| DietError::NotFound(format!("MealDay {}", day_id)))
    }

    /// Days of a plan ordered by day index. An unknown plan id yields an
    /// empty list.
    pub async fn list_days(&self, plan_id: i64) -> Result<Vec<MealDay>, DietError> {
        Ok(self.repo.list_days(plan_id).await?)
    }

    /// Move a day to another index. The new index is not checked against
    /// the plan's other days.
    pub async fn update_day_index(
        &self,
        day_id: i64,
        new_index: i64,
    ) -> Result<MealDay, DietError> {
        self.get_day(day_id).await?;
        self.repo.set_day_index(day_id, new_index).await?;
        self.get_day(day_id).await
    }

    /// Remove a day and its items. Returns false when no such day exists.
    pub async fn remove_day(&self, day_id: i64) -> Result<bool, DietError> {
        Ok(self.repo.delete_day(day_id).await?)
    }

    /// Add an item to the plan's day with this index, creating the day on
    /// demand.
    pub async fn add_item(
        &self,
        plan_id: i64,
        day_index: i64,
        draft: &ItemDraft,
    ) -> Result<MealItem, DietError> {
        let day = match self.repo.find_day(plan_id, day_index).await? {
            Some(day) => day,
            None => self.add_or_get_day(plan_id, day_index).await?,
        };

        let item = self.repo.create_item(day.id, draft).await?;
        tracing::info!("Created meal item {} in day {}", item.id, day.id);
        Ok(item)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<MealItem, DietError> {
        self.repo
            .get_item(item_id)
            .await?
            .ok_or_else(|| DietError::NotFound(format!("MealItem {}", item_id)))
    }

    /// Items of a day ordered by id.
    pub async fn list_items(&self, day_id: i64) -> Result<Vec<MealItem>, DietError> {
        Ok(self.repo.list_items(day_id).await?)
    }

    /// Overwrite an item's food, quantity, unit and meal type.
    pub async fn update_item(
        &self,
        item_id: i64,
        draft: &ItemDraft,
    ) -> Result<MealItem, DietError> {
        self.get_item(item_id).await?;
        self.repo.update_item(item_id, draft).await?;
        self.get_item(item_id).await
    }

    /// Remove a single item. Returns false when no such item exists.
    pub async fn remove_item(&self, item_id: i64) -> Result<bool, DietError> {
        Ok(self.repo.delete_item(item_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::MealType;
    use tempfile::TempDir;

    struct TestContext {
        service: PlanCompositionService,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(Some(db_path)).await.unwrap();
        TestContext {
            service: PlanCompositionService::new(PlanRepository::new(pool)),
            _temp_dir: temp_dir,
        }
    }

    fn draft(food_id: i64, meal_type: MealType) -> ItemDraft {
        ItemDraft {
            food_id,
            quantity: 100.0,
            unit: "g".to_string(),
            meal_type,
        }
    }

    #[tokio::test]
    async fn test_add_or_get_day_is_idempotent() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let plan = svc.create_plan(1, "Plan", None, &[]).await.unwrap();

        let first = svc.add_or_get_day(plan.id, 3).await.unwrap();
        let second = svc.add_or_get_day(plan.id, 3).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(svc.list_days(plan.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_or_get_day_unknown_plan() {
        let ctx = setup().await;

        let err = ctx.service.add_or_get_day(999, 1).await.unwrap_err();
        assert!(matches!(err, DietError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_item_creates_day_on_demand() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let plan = svc.create_plan(1, "Plan", None, &[]).await.unwrap();
        assert!(svc.list_days(plan.id).await.unwrap().is_empty());

        let item = svc
            .add_item(plan.id, 5, &draft(7, MealType::Dinner))
            .await
            .unwrap();

        let days = svc.list_days(plan.id).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day_index, 5);
        assert_eq!(days[0].items.len(), 1);
        assert_eq!(days[0].items[0].id, item.id);

        // A second item on the same day reuses it
        svc.add_item(plan.id, 5, &draft(8, MealType::Lunch))
            .await
            .unwrap();
        assert_eq!(svc.list_days(plan.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_item_unknown_plan() {
        let ctx = setup().await;

        let err = ctx
            .service
            .add_item(42, 1, &draft(1, MealType::Lunch))
            .await
            .unwrap_err();
        assert!(matches!(err, DietError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_plan_cascade_then_not_found() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let days = vec![DayDraft {
            day_index: 1,
            items: vec![draft(1, MealType::Breakfast)],
        }];
        let plan = svc.create_plan(1, "Plan", None, &days).await.unwrap();
        let day_id = plan.days[0].id;
        let item_id = plan.days[0].items[0].id;

        assert!(svc.delete_plan(plan.id).await.unwrap());

        assert!(matches!(
            svc.get_plan(plan.id).await.unwrap_err(),
            DietError::NotFound(_)
        ));
        assert!(matches!(
            svc.get_day(day_id).await.unwrap_err(),
            DietError::NotFound(_)
        ));
        assert!(matches!(
            svc.get_item(item_id).await.unwrap_err(),
            DietError::NotFound(_)
        ));

        // Deleting again is not an error, it just reports false
        assert!(!svc.delete_plan(plan.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_header_policies() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let plan = svc
            .create_plan(1, "Original", Some("original notes"), &[])
            .await
            .unwrap();

        // Blank title is ignored, notes always overwritten
        let updated = svc
            .update_header(plan.id, Some("   ".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.title, "Original");
        assert!(updated.notes.is_none());

        let updated = svc
            .update_header(plan.id, Some("Renamed".to_string()), Some("new notes".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.notes.as_deref(), Some("new notes"));
    }

    #[tokio::test]
    async fn test_list_plans_newest_first() {
        let ctx = setup().await;
        let svc = &ctx.service;

        svc.create_plan(9, "A", None, &[]).await.unwrap();
        svc.create_plan(9, "B", None, &[]).await.unwrap();

        let plans = svc.list_plans(9).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].title, "B");
    }

    #[tokio::test]
    async fn test_remove_day_and_item_report_existence() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let plan = svc.create_plan(1, "Plan", None, &[]).await.unwrap();
        let day = svc.add_or_get_day(plan.id, 1).await.unwrap();
        let item = svc
            .add_item(plan.id, 1, &draft(1, MealType::Lunch))
            .await
            .unwrap();

        assert!(svc.remove_item(item.id).await.unwrap());
        assert!(!svc.remove_item(item.id).await.unwrap());

        assert!(svc.remove_day(day.id).await.unwrap());
        assert!(!svc.remove_day(day.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_day_index_and_item() {
        let ctx = setup().await;
        let svc = &ctx.service;

        let plan = svc.create_plan(1, "Plan", None, &[]).await.unwrap();
        let day = svc.add_or_get_day(plan.id, 1).await.unwrap();

        let moved = svc.update_day_index(day.id, 6).await.unwrap();
        assert_eq!(moved.day_index, 6);

        let item = svc
            .add_item(plan.id, 6, &draft(1, MealType::Lunch))
            .await
            .unwrap();
        let updated = svc
            .update_item(item.id, &draft(2, MealType::Dinner))
            .await
            .unwrap();
        assert_eq!(updated.food_id, 2);
        assert_eq!(updated.meal_type, MealType::Dinner);
    }
}
