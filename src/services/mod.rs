mod item_service;
mod plan_service;
pub mod summary;

pub use item_service::{
    BatchFailure, BatchReport, BatchStatus, DietItemDraft, DietItemUpdate, DietPlanItemService,
};
pub use plan_service::PlanCompositionService;
