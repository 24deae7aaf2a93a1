use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::{DayDraft, ItemDraft, MealType};
use crate::services::PlanCompositionService;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Create a new meal plan
    Create {
        /// Patient the plan belongs to
        #[arg(long, short)]
        patient: i64,

        /// Plan title
        #[arg(long, short)]
        title: String,

        /// Plan notes
        #[arg(long)]
        notes: Option<String>,

        /// JSON file with nested days and items
        #[arg(long, value_name = "FILE")]
        days: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a plan with all its days and items
    Get {
        /// Plan ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List a patient's plans, most recent first
    List {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update title and/or notes of a plan. Omitting --notes clears them.
    UpdateHeader {
        /// Plan ID
        id: i64,

        /// New title (blank values are ignored)
        #[arg(long)]
        title: Option<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a plan and everything under it
    Delete {
        /// Plan ID
        id: i64,
    },

    /// Add a day to a plan (returns the existing day if present)
    AddDay {
        /// Plan ID
        #[arg(long)]
        plan: i64,

        /// Day index (1-7)
        #[arg(long, short)]
        day: i64,
    },

    /// Remove a day and its items
    RemoveDay {
        /// Day ID
        id: i64,
    },

    /// Add a food item to a day of a plan, creating the day if needed
    AddItem {
        /// Plan ID
        #[arg(long)]
        plan: i64,

        /// Day index (1-7)
        #[arg(long, short)]
        day: i64,

        /// Food ID
        #[arg(long)]
        food: i64,

        /// Quantity of food
        #[arg(long, short)]
        quantity: f64,

        /// Unit of measure (g, ml, pc, ...)
        #[arg(long, short)]
        unit: String,

        /// Meal type (breakfast, morning-snack, lunch, afternoon-snack, dinner, evening-snack)
        #[arg(long = "meal", short = 'm', value_name = "MEAL")]
        meal_type: String,
    },

    /// Remove a single item
    RemoveItem {
        /// Item ID
        id: i64,
    },
}

impl PlanCommand {
    pub async fn run(
        &self,
        service: &PlanCompositionService,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PlanSubcommand::Create {
                patient,
                title,
                notes,
                days,
                format,
            } => {
                let day_drafts: Vec<DayDraft> = match days {
                    Some(path) => {
                        let contents = std::fs::read_to_string(path)?;
                        serde_json::from_str(&contents)?
                    }
                    None => Vec::new(),
                };

                let plan = service
                    .create_plan(*patient, title, notes.as_deref(), &day_drafts)
                    .await?;

                match format {
                    OutputFormat::Text => {
                        println!("Created meal plan:");
                        println!("{}", plan);
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                }
                Ok(())
            }

            PlanSubcommand::Get { id, format } => {
                let plan = service.get_plan(*id).await?;
                match format {
                    OutputFormat::Text => println!("{}", plan),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                }
                Ok(())
            }

            PlanSubcommand::List { patient, format } => {
                let plans = service.list_plans(*patient).await?;
                match format {
                    OutputFormat::Text => {
                        if plans.is_empty() {
                            println!("No meal plans found");
                        }
                        for plan in &plans {
                            println!("#{} {} ({} days)", plan.id, plan.title, plan.days.len());
                        }
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plans)?),
                }
                Ok(())
            }

            PlanSubcommand::UpdateHeader { id, title, notes } => {
                let plan = service
                    .update_header(*id, title.clone(), notes.clone())
                    .await?;
                println!("Updated meal plan:");
                println!("{}", plan);
                Ok(())
            }

            PlanSubcommand::Delete { id } => {
                if service.delete_plan(*id).await? {
                    println!("Deleted meal plan {}", id);
                } else {
                    println!("No meal plan with id {}", id);
                }
                Ok(())
            }

            PlanSubcommand::AddDay { plan, day } => {
                let added = service.add_or_get_day(*plan, *day).await?;
                println!("Day {} of plan {} has id {}", added.day_index, plan, added.id);
                Ok(())
            }

            PlanSubcommand::RemoveDay { id } => {
                if service.remove_day(*id).await? {
                    println!("Removed day {}", id);
                } else {
                    println!("No day with id {}", id);
                }
                Ok(())
            }

            PlanSubcommand::AddItem {
                plan,
                day,
                food,
                quantity,
                unit,
                meal_type,
            } => {
                let meal_type: MealType = meal_type.parse()?;
                let draft = ItemDraft {
                    food_id: *food,
                    quantity: *quantity,
                    unit: unit.clone(),
                    meal_type,
                };

                let item = service.add_item(*plan, *day, &draft).await?;
                println!(
                    "Added item {}: food {} x {} {} at {}",
                    item.id,
                    item.food_id,
                    item.quantity,
                    item.unit,
                    item.meal_type.display_name()
                );
                Ok(())
            }

            PlanSubcommand::RemoveItem { id } => {
                if service.remove_item(*id).await? {
                    println!("Removed item {}", id);
                } else {
                    println!("No item with id {}", id);
                }
                Ok(())
            }
        }
    }
}
