use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::DietItemRepository;
use crate::error::DietError;
use crate::models::{DietItem, MealType, MealTypeParseError};
use crate::services::summary::{self, PlanSummary};

/// Creation request for a flat diet item. The meal type travels as a raw
/// string and is parsed here; an unrecognized value rejects the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietItemDraft {
    pub patient_id: i64,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub day_of_week: i64,
    pub meal_type: String,
    pub food_id: i64,
    #[serde(default)]
    pub food_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub proteins: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fats: Option<f64>,
}

/// Partial update for a flat diet item: absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DietItemUpdate {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub day_of_week: Option<i64>,
    pub meal_type: Option<String>,
    pub food_id: Option<i64>,
    pub food_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
}

/// One failed element of a batch create.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Position of the request in the submitted batch.
    pub index: usize,
    /// Food name if supplied, otherwise the food id.
    pub label: String,
    pub reason: String,
}

/// Result of a batch create: every element is attempted, successes and
/// failures are collected side by side.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub created: Vec<DietItem>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every element was created.
    Created,
    /// Some elements were created, some failed.
    Partial,
    /// Nothing was created.
    Failed,
}

impl BatchReport {
    pub fn status(&self) -> BatchStatus {
        if self.failures.is_empty() {
            BatchStatus::Created
        } else if self.created.is_empty() {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        }
    }
}

/// Operations on the flat diet-item model: per-row lifecycle with soft
/// deletion, plan-group queries, duplication and batch writes.
pub struct DietPlanItemService {
    repo: DietItemRepository,
}

impl DietPlanItemService {
    pub fn new(repo: DietItemRepository) -> Self {
        Self { repo }
    }

    /// Create one item. Rejected when an active row already matches the
    /// (patient, title, day, meal, food) tuple.
    pub async fn create(&self, draft: DietItemDraft) -> Result<DietItem, DietError> {
        tracing::info!(
            "Creating plan item for patient {} - title: {}",
            draft.patient_id,
            draft.title
        );

        let meal_type: MealType = draft
            .meal_type
            .parse()
            .map_err(|e: MealTypeParseError| DietError::InvalidValue(e.to_string()))?;

        let exists = self
            .repo
            .exists_active(
                draft.patient_id,
                &draft.title,
                draft.day_of_week,
                meal_type,
                draft.food_id,
            )
            .await?;
        if exists {
            return Err(DietError::Duplicate(
                "plan item for this day and meal".to_string(),
            ));
        }

        let item = DietItem::new(
            draft.patient_id,
            draft.title,
            draft.day_of_week,
            meal_type,
            draft.food_id,
            draft.quantity,
            draft.unit,
        )
        .with_notes(draft.notes)
        .with_food_name(draft.food_name)
        .with_nutrition(draft.calories, draft.proteins, draft.carbs, draft.fats);

        Ok(self.repo.create(&item).await?)
    }

    /// Lookup by id; soft-deleted rows are still returned.
    pub async fn find_by_id(&self, id: i64) -> Result<DietItem, DietError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| DietError::NotFound(format!("Diet item {}", id)))
    }

    /// Active items of a plan group, ordered by day then meal schedule.
    pub async fn find_plan_items(
        &self,
        patient_id: i64,
        title: &str,
    ) -> Result<Vec<DietItem>, DietError> {
        Ok(self.repo.find_plan_items(patient_id, title).await?)
    }

    /// Active items of one day, ordered by meal schedule.
    pub async fn find_by_day(
        &self,
        patient_id: i64,
        title: &str,
        day_of_week: i64,
    ) -> Result<Vec<DietItem>, DietError> {
        Ok(self.repo.find_by_day(patient_id, title, day_of_week).await?)
    }

    /// Active items of one meal across the week, ordered by day.
    pub async fn find_by_meal_type(
        &self,
        patient_id: i64,
        title: &str,
        meal_type: MealType,
    ) -> Result<Vec<DietItem>, DietError> {
        Ok(self
            .repo
            .find_by_meal_type(patient_id, title, meal_type)
            .await?)
    }

    /// Titles of the patient's plans, alphabetical.
    pub async fn get_plan_titles(&self, patient_id: i64) -> Result<Vec<String>, DietError> {
        Ok(self.repo.distinct_titles(patient_id).await?)
    }

    /// Apply the supplied fields to an item and stamp updated_at. A
    /// malformed meal-type string rejects the whole update before any field
    /// is applied.
    pub async fn update(&self, id: i64, update: DietItemUpdate) -> Result<DietItem, DietError> {
        tracing::info!("Updating plan item {}", id);

        let mut item = self.find_by_id(id).await?;

        let meal_type = match &update.meal_type {
            Some(raw) => Some(
                raw.parse::<MealType>()
                    .map_err(|e| DietError::InvalidValue(e.to_string()))?,
            ),
            None => None,
        };

        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(notes) = update.notes {
            item.notes = Some(notes);
        }
        if let Some(day_of_week) = update.day_of_week {
            item.day_of_week = day_of_week;
        }
        if let Some(meal_type) = meal_type {
            item.meal_type = meal_type;
        }
        if let Some(food_id) = update.food_id {
            item.food_id = food_id;
        }
        if let Some(food_name) = update.food_name {
            item.food_name = Some(food_name);
        }
        if let Some(quantity) = update.quantity {
            item.quantity = quantity;
        }
        if let Some(unit) = update.unit {
            item.unit = unit;
        }
        if let Some(calories) = update.calories {
            item.calories = Some(calories);
        }
        if let Some(proteins) = update.proteins {
            item.proteins = Some(proteins);
        }
        if let Some(carbs) = update.carbs {
            item.carbs = Some(carbs);
        }
        if let Some(fats) = update.fats {
            item.fats = Some(fats);
        }

        item.updated_at = Some(Utc::now());
        Ok(self.repo.update(&item).await?)
    }

    /// Soft-delete one item: the row stays, active goes down, updated_at is
    /// stamped.
    pub async fn delete_item(&self, id: i64) -> Result<(), DietError> {
        tracing::info!("Deleting plan item {}", id);

        let mut item = self.find_by_id(id).await?;
        item.active = false;
        item.updated_at = Some(Utc::now());
        self.repo.update(&item).await?;
        Ok(())
    }

    /// Soft-delete every row of a plan group. An empty group is a no-op.
    pub async fn delete_plan(&self, patient_id: i64, title: &str) -> Result<u64, DietError> {
        tracing::info!("Deleting plan '{}' for patient {}", title, patient_id);
        Ok(self.repo.soft_delete_plan(patient_id, title).await?)
    }

    /// Copy every active row of the source group into a new group carrying
    /// the new title, fresh ids and timestamps.
    pub async fn duplicate_plan(
        &self,
        patient_id: i64,
        source_title: &str,
        new_title: &str,
    ) -> Result<Vec<DietItem>, DietError> {
        tracing::info!(
            "Duplicating plan '{}' as '{}' for patient {}",
            source_title,
            new_title,
            patient_id
        );

        if self.repo.has_active_title(patient_id, new_title).await? {
            return Err(DietError::Duplicate(format!("plan titled '{}'", new_title)));
        }

        let source_items = self.repo.find_plan_items(patient_id, source_title).await?;
        if source_items.is_empty() {
            return Err(DietError::NotFound(format!(
                "source plan '{}'",
                source_title
            )));
        }

        let copies: Vec<DietItem> = source_items
            .into_iter()
            .map(|src| {
                DietItem::new(
                    src.patient_id,
                    new_title,
                    src.day_of_week,
                    src.meal_type,
                    src.food_id,
                    src.quantity,
                    src.unit,
                )
                .with_notes(src.notes)
                .with_food_name(src.food_name)
                .with_nutrition(src.calories, src.proteins, src.carbs, src.fats)
            })
            .collect();

        Ok(self.repo.insert_all(&copies).await?)
    }

    /// Summary of a plan group; fails when the group has no active rows.
    pub async fn get_plan_summary(
        &self,
        patient_id: i64,
        title: &str,
    ) -> Result<PlanSummary, DietError> {
        tracing::info!("Building summary for plan '{}' of patient {}", title, patient_id);

        let items = self.repo.find_plan_items(patient_id, title).await?;
        if items.is_empty() {
            return Err(DietError::NotFound(format!("plan '{}'", title)));
        }

        Ok(summary::summarize(patient_id, title, &items))
    }

    /// Attempt every element of the batch independently; failures never
    /// abort the remaining elements.
    pub async fn create_batch(&self, drafts: Vec<DietItemDraft>) -> BatchReport {
        tracing::info!("Creating batch of {} plan item(s)", drafts.len());

        let mut report = BatchReport {
            created: Vec::new(),
            failures: Vec::new(),
        };

        for (index, draft) in drafts.into_iter().enumerate() {
            let label = draft
                .food_name
                .clone()
                .unwrap_or_else(|| format!("food {}", draft.food_id));

            match self.create(draft).await {
                Ok(item) => report.created.push(item),
                Err(e) => {
                    tracing::error!("Batch create failed for {}: {}", label, e);
                    report.failures.push(BatchFailure {
                        index,
                        label,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Best-effort batch soft-delete. Per-id failures are logged and
    /// skipped; returns how many items were actually deleted.
    pub async fn delete_batch(&self, ids: &[i64]) -> u64 {
        tracing::info!("Deleting batch of {} plan item(s)", ids.len());

        let mut deleted = 0;
        for &id in ids {
            match self.delete_item(id).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::error!("Batch delete failed for item {}: {}", id, e),
            }
        }
        deleted
    }
}
