use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{DietItem, MealType};

/// The weekly average always divides by a full week, not by the number of
/// days that actually have items.
const WEEK_DAYS: f64 = 7.0;

/// Nutrient totals across a plan. Items with no recorded value contribute
/// zero instead of poisoning the sums.
#[derive(Debug, Clone, Serialize)]
pub struct NutritionTotals {
    pub total_calories: f64,
    pub total_proteins: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    pub avg_daily_calories: f64,
}

/// Full summary of one plan group.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub patient_id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub total_items: usize,
    pub items_by_day: BTreeMap<i64, Vec<DietItem>>,
    pub items_by_meal_type: BTreeMap<MealType, Vec<DietItem>>,
    pub total_nutrition: NutritionTotals,
}

/// Compute a plan summary from an already-loaded item list. Grouping keeps
/// the incoming order of items within each group.
pub fn summarize(patient_id: i64, title: &str, items: &[DietItem]) -> PlanSummary {
    let mut items_by_day: BTreeMap<i64, Vec<DietItem>> = BTreeMap::new();
    let mut items_by_meal_type: BTreeMap<MealType, Vec<DietItem>> = BTreeMap::new();

    let mut total_calories = 0.0;
    let mut total_proteins = 0.0;
    let mut total_carbs = 0.0;
    let mut total_fats = 0.0;

    for item in items {
        items_by_day
            .entry(item.day_of_week)
            .or_default()
            .push(item.clone());
        items_by_meal_type
            .entry(item.meal_type)
            .or_default()
            .push(item.clone());

        total_calories += item.calories.unwrap_or(0.0);
        total_proteins += item.proteins.unwrap_or(0.0);
        total_carbs += item.carbs.unwrap_or(0.0);
        total_fats += item.fats.unwrap_or(0.0);
    }

    PlanSummary {
        patient_id,
        title: title.to_string(),
        notes: items.first().and_then(|i| i.notes.clone()),
        total_items: items.len(),
        items_by_day,
        items_by_meal_type,
        total_nutrition: NutritionTotals {
            total_calories,
            total_proteins,
            total_carbs,
            total_fats,
            avg_daily_calories: total_calories / WEEK_DAYS,
        },
    }
}
