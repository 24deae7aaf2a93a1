//! Crate-wide error type for diet-plan operations.

/// Errors surfaced by the plan and item services.
#[derive(Debug)]
pub enum DietError {
    /// The requested plan, day, item, or plan group does not exist.
    NotFound(String),
    /// A write was rejected because matching active data already exists.
    Duplicate(String),
    /// A request carried a value that cannot be interpreted.
    InvalidValue(String),
    /// The backing store failed.
    Database(sqlx::Error),
}

impl std::fmt::Display for DietError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DietError::NotFound(what) => write!(f, "Not found: {}", what),
            DietError::Duplicate(what) => write!(f, "Already exists: {}", what),
            DietError::InvalidValue(what) => write!(f, "Invalid value: {}", what),
            DietError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for DietError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DietError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DietError {
    fn from(e: sqlx::Error) -> Self {
        DietError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = DietError::NotFound("MealPlan 42".to_string());
        assert_eq!(err.to_string(), "Not found: MealPlan 42");
    }

    #[test]
    fn test_display_duplicate() {
        let err = DietError::Duplicate("plan item".to_string());
        assert!(err.to_string().contains("Already exists"));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: DietError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DietError::Database(_)));
    }
}
