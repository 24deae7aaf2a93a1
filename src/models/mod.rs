mod diet_item;
mod meal_plan;
mod meal_type;

pub use diet_item::{day_name, DietItem};
pub use meal_plan::{DayDraft, ItemDraft, MealDay, MealItem, MealPlan};
pub use meal_type::{MealType, MealTypeParseError};
