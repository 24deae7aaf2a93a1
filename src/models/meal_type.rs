use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The meals of a day. Variants are declared in time-of-day order so the
/// derived `Ord` matches the daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealType {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
    EveningSnack,
}

impl MealType {
    /// Position of the meal within the day, 1 (breakfast) to 6 (evening snack).
    pub fn rank(&self) -> u8 {
        match self {
            MealType::Breakfast => 1,
            MealType::MorningSnack => 2,
            MealType::Lunch => 3,
            MealType::AfternoonSnack => 4,
            MealType::Dinner => 5,
            MealType::EveningSnack => 6,
        }
    }

    /// Human-readable name for display output.
    pub fn display_name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::MorningSnack => "Morning Snack",
            MealType::Lunch => "Lunch",
            MealType::AfternoonSnack => "Afternoon Snack",
            MealType::Dinner => "Dinner",
            MealType::EveningSnack => "Evening Snack",
        }
    }

    /// Customary time of day for the meal.
    pub fn default_time(&self) -> &'static str {
        match self {
            MealType::Breakfast => "08:00",
            MealType::MorningSnack => "10:30",
            MealType::Lunch => "13:00",
            MealType::AfternoonSnack => "16:30",
            MealType::Dinner => "20:00",
            MealType::EveningSnack => "22:00",
        }
    }

    /// True for breakfast, lunch and dinner.
    pub fn is_main_meal(&self) -> bool {
        matches!(
            self,
            MealType::Breakfast | MealType::Lunch | MealType::Dinner
        )
    }

    /// True for the snacks between main meals.
    pub fn is_snack(&self) -> bool {
        !self.is_main_meal()
    }

    /// The three main meals, in order.
    pub fn main_meals() -> [MealType; 3] {
        [MealType::Breakfast, MealType::Lunch, MealType::Dinner]
    }

    /// The three snacks, in order.
    pub fn snacks() -> [MealType; 3] {
        [
            MealType::MorningSnack,
            MealType::AfternoonSnack,
            MealType::EveningSnack,
        ]
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "breakfast"),
            MealType::MorningSnack => write!(f, "morning-snack"),
            MealType::Lunch => write!(f, "lunch"),
            MealType::AfternoonSnack => write!(f, "afternoon-snack"),
            MealType::Dinner => write!(f, "dinner"),
            MealType::EveningSnack => write!(f, "evening-snack"),
        }
    }
}

impl FromStr for MealType {
    type Err = MealTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "morning-snack" => Ok(MealType::MorningSnack),
            "lunch" => Ok(MealType::Lunch),
            "afternoon-snack" => Ok(MealType::AfternoonSnack),
            "dinner" => Ok(MealType::Dinner),
            "evening-snack" => Ok(MealType::EveningSnack),
            _ => Err(MealTypeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized meal-type string.
#[derive(Debug, Clone)]
pub struct MealTypeParseError(pub String);

impl fmt::Display for MealTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid meal type '{}'. Valid options: breakfast, morning-snack, lunch, \
             afternoon-snack, dinner, evening-snack",
            self.0
        )
    }
}

impl std::error::Error for MealTypeParseError {}
