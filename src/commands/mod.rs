mod config_cmd;
mod item;
mod plan;

pub use config_cmd::ConfigCommand;
pub use item::ItemCommand;
pub use plan::PlanCommand;
