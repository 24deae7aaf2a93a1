use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;

/// Aggregate root of the structured weekly plan. Owns its days: deleting a
/// plan deletes every day and item underneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub patient_id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub days: Vec<MealDay>,
}

/// One day of a plan. At most one day per (plan, day_index); day_index is
/// conventionally 1-7 but not range-checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealDay {
    pub id: i64,
    pub plan_id: i64,
    pub day_index: i64,
    pub items: Vec<MealItem>,
}

/// A food row within a day. Items of the same day carry no uniqueness rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItem {
    pub id: i64,
    pub day_id: i64,
    pub food_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub meal_type: MealType,
}

/// Descriptor for a day supplied with a plan-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayDraft {
    pub day_index: i64,
    #[serde(default)]
    pub items: Vec<ItemDraft>,
}

/// Descriptor for an item supplied with a creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    pub food_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub meal_type: MealType,
}

impl fmt::Display for MealPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "Plan #{} for patient {}", self.id, self.patient_id)?;
        if let Some(notes) = &self.notes {
            writeln!(f, "Notes: {}", notes)?;
        }

        for day in &self.days {
            writeln!(f, "\nDay {}:", day.day_index)?;
            for item in &day.items {
                writeln!(
                    f,
                    "  - [{}] food {} x {} {}",
                    item.meal_type.display_name(),
                    item.food_id,
                    item.quantity,
                    item.unit
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> MealPlan {
        MealPlan {
            id: 1,
            patient_id: 10,
            title: "Spring Plan".to_string(),
            notes: Some("low carb".to_string()),
            days: vec![MealDay {
                id: 2,
                plan_id: 1,
                day_index: 1,
                items: vec![MealItem {
                    id: 3,
                    day_id: 2,
                    food_id: 77,
                    quantity: 150.0,
                    unit: "g".to_string(),
                    meal_type: MealType::Lunch,
                }],
            }],
        }
    }

    #[test]
    fn test_meal_plan_display() {
        let output = format!("{}", sample_plan());
        assert!(output.contains("Spring Plan"));
        assert!(output.contains("Day 1:"));
        assert!(output.contains("[Lunch] food 77 x 150 g"));
        assert!(output.contains("low carb"));
    }

    #[test]
    fn test_meal_plan_json_roundtrip() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: MealPlan = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.title, plan.title);
        assert_eq!(parsed.days.len(), 1);
        assert_eq!(parsed.days[0].items[0].meal_type, MealType::Lunch);
    }

    #[test]
    fn test_day_draft_items_default_empty() {
        let draft: DayDraft = serde_json::from_str(r#"{"day_index": 3}"#).unwrap();
        assert_eq!(draft.day_index, 3);
        assert!(draft.items.is_empty());
    }
}
