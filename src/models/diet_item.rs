use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;

/// One row of the flat plan representation: a single food on a given day
/// and meal, with cached catalog data. All active rows sharing
/// (patient_id, title) form one logical plan. Rows are soft-deleted by
/// clearing `active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietItem {
    pub id: i64,
    pub patient_id: i64,
    pub title: String,
    pub notes: Option<String>,
    /// Day of week, 1 = Monday .. 7 = Sunday.
    pub day_of_week: i64,
    pub meal_type: MealType,
    pub food_id: i64,
    /// Food name cached from the catalog to avoid cross-service lookups.
    pub food_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DietItem {
    /// Builds a fresh, active row with `created_at` stamped now. The id is
    /// assigned by the store on insert.
    pub fn new(
        patient_id: i64,
        title: impl Into<String>,
        day_of_week: i64,
        meal_type: MealType,
        food_id: i64,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            patient_id,
            title: title.into(),
            notes: None,
            day_of_week,
            meal_type,
            food_id,
            food_name: None,
            quantity,
            unit: unit.into(),
            calories: None,
            proteins: None,
            carbs: None,
            fats: None,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_food_name(mut self, food_name: Option<String>) -> Self {
        self.food_name = food_name;
        self
    }

    pub fn with_nutrition(
        mut self,
        calories: Option<f64>,
        proteins: Option<f64>,
        carbs: Option<f64>,
        fats: Option<f64>,
    ) -> Self {
        self.calories = calories;
        self.proteins = proteins;
        self.carbs = carbs;
        self.fats = fats;
        self
    }

    /// Name of the item's day, if the index is in 1-7.
    pub fn day_name(&self) -> Option<&'static str> {
        day_name(self.day_of_week)
    }
}

/// Maps a 1-7 day-of-week index to its English name.
pub fn day_name(day_of_week: i64) -> Option<&'static str> {
    match day_of_week {
        1 => Some("Monday"),
        2 => Some("Tuesday"),
        3 => Some("Wednesday"),
        4 => Some("Thursday"),
        5 => Some("Friday"),
        6 => Some("Saturday"),
        7 => Some("Sunday"),
        _ => None,
    }
}

impl fmt::Display for DietItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.day_name().unwrap_or("?");
        let food = self
            .food_name
            .as_deref()
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("food {}", self.food_id));
        write!(
            f,
            "#{} {} {} - {} x {} {}",
            self.id,
            day,
            self.meal_type.display_name(),
            food,
            self.quantity,
            self.unit
        )?;
        if let Some(kcal) = self.calories {
            write!(f, " ({} kcal)", kcal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_defaults() {
        let item = DietItem::new(1, "Plan A", 3, MealType::Lunch, 42, 150.0, "g");

        assert_eq!(item.id, 0);
        assert_eq!(item.patient_id, 1);
        assert_eq!(item.title, "Plan A");
        assert_eq!(item.day_of_week, 3);
        assert!(item.active);
        assert!(item.notes.is_none());
        assert!(item.calories.is_none());
        assert!(item.updated_at.is_none());
    }

    #[test]
    fn test_builders() {
        let item = DietItem::new(1, "Plan A", 1, MealType::Breakfast, 5, 30.0, "g")
            .with_notes(Some("toasted".to_string()))
            .with_food_name(Some("Bread".to_string()))
            .with_nutrition(Some(80.0), Some(3.0), Some(15.0), Some(1.0));

        assert_eq!(item.notes.as_deref(), Some("toasted"));
        assert_eq!(item.food_name.as_deref(), Some("Bread"));
        assert_eq!(item.calories, Some(80.0));
        assert_eq!(item.fats, Some(1.0));
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name(1), Some("Monday"));
        assert_eq!(day_name(7), Some("Sunday"));
        assert_eq!(day_name(0), None);
        assert_eq!(day_name(8), None);
    }

    #[test]
    fn test_display() {
        let mut item = DietItem::new(1, "Plan A", 5, MealType::Dinner, 9, 200.0, "g")
            .with_food_name(Some("Salmon".to_string()))
            .with_nutrition(Some(412.0), None, None, None);
        item.id = 17;

        let out = format!("{}", item);
        assert!(out.contains("#17"));
        assert!(out.contains("Friday"));
        assert!(out.contains("Dinner"));
        assert!(out.contains("Salmon"));
        assert!(out.contains("412 kcal"));
    }

    #[test]
    fn test_json_roundtrip() {
        let item = DietItem::new(2, "Plan B", 6, MealType::MorningSnack, 3, 1.0, "pc");
        let json = serde_json::to_string(&item).unwrap();
        let parsed: DietItem = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.title, item.title);
        assert_eq!(parsed.meal_type, item.meal_type);
        assert_eq!(parsed.created_at, item.created_at);
    }
}
