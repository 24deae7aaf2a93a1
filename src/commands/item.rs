use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::plan::OutputFormat;
use crate::models::{day_name, MealType};
use crate::services::{BatchStatus, DietItemDraft, DietItemUpdate, DietPlanItemService};
use crate::services::summary::PlanSummary;

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add a single item to a diet plan
    Add {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Plan title the item belongs to
        #[arg(long, short)]
        title: String,

        /// Day of week (1=Monday .. 7=Sunday)
        #[arg(long, short)]
        day: i64,

        /// Meal type (breakfast, morning-snack, lunch, afternoon-snack, dinner, evening-snack)
        #[arg(long = "meal", short = 'm', value_name = "MEAL")]
        meal_type: String,

        /// Food ID
        #[arg(long)]
        food: i64,

        /// Cached food name
        #[arg(long)]
        food_name: Option<String>,

        /// Quantity of food
        #[arg(long, short)]
        quantity: f64,

        /// Unit of measure (g, ml, pc, ...)
        #[arg(long, short)]
        unit: String,

        /// Plan notes
        #[arg(long)]
        notes: Option<String>,

        /// Calories for this portion
        #[arg(long)]
        calories: Option<f64>,

        /// Proteins in grams
        #[arg(long)]
        proteins: Option<f64>,

        /// Carbs in grams
        #[arg(long)]
        carbs: Option<f64>,

        /// Fats in grams
        #[arg(long)]
        fats: Option<f64>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one item by id (soft-deleted items included)
    Show {
        /// Item ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the active items of a plan, optionally filtered by day or meal
    List {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Plan title
        #[arg(long, short)]
        title: String,

        /// Only this day of week (1-7)
        #[arg(long, short)]
        day: Option<i64>,

        /// Only this meal type
        #[arg(long = "meal", short = 'm', value_name = "MEAL")]
        meal_type: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the titles of a patient's plans
    Titles {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,
    },

    /// Update fields of an item; omitted fields stay unchanged
    Update {
        /// Item ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Day of week (1-7)
        #[arg(long, short)]
        day: Option<i64>,

        /// Meal type
        #[arg(long = "meal", short = 'm', value_name = "MEAL")]
        meal_type: Option<String>,

        #[arg(long)]
        food: Option<i64>,

        #[arg(long)]
        food_name: Option<String>,

        #[arg(long, short)]
        quantity: Option<f64>,

        #[arg(long, short)]
        unit: Option<String>,

        #[arg(long)]
        calories: Option<f64>,

        #[arg(long)]
        proteins: Option<f64>,

        #[arg(long)]
        carbs: Option<f64>,

        #[arg(long)]
        fats: Option<f64>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Soft-delete one item
    Delete {
        /// Item ID
        id: i64,
    },

    /// Soft-delete every item of a plan
    DeletePlan {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Plan title
        #[arg(long, short)]
        title: String,
    },

    /// Copy a plan's active items under a new title
    Duplicate {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Title of the plan to copy
        #[arg(long)]
        source: String,

        /// Title of the copy
        #[arg(long)]
        target: String,
    },

    /// Show grouped items and nutrition totals of a plan
    Summary {
        /// Patient ID
        #[arg(long, short)]
        patient: i64,

        /// Plan title
        #[arg(long, short)]
        title: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add many items from a JSON file; failures do not stop the rest
    BatchAdd {
        /// JSON file with an array of item requests
        file: PathBuf,
    },

    /// Soft-delete many items by id, best effort
    BatchDelete {
        /// Item IDs
        ids: Vec<i64>,
    },
}

impl ItemCommand {
    pub async fn run(
        &self,
        service: &DietPlanItemService,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ItemSubcommand::Add {
                patient,
                title,
                day,
                meal_type,
                food,
                food_name,
                quantity,
                unit,
                notes,
                calories,
                proteins,
                carbs,
                fats,
                format,
            } => {
                let draft = DietItemDraft {
                    patient_id: *patient,
                    title: title.clone(),
                    notes: notes.clone(),
                    day_of_week: *day,
                    meal_type: meal_type.clone(),
                    food_id: *food,
                    food_name: food_name.clone(),
                    quantity: *quantity,
                    unit: unit.clone(),
                    calories: *calories,
                    proteins: *proteins,
                    carbs: *carbs,
                    fats: *fats,
                };

                let item = service.create(draft).await?;
                match format {
                    OutputFormat::Text => println!("Created {}", item),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
                }
                Ok(())
            }

            ItemSubcommand::Show { id, format } => {
                let item = service.find_by_id(*id).await?;
                match format {
                    OutputFormat::Text => {
                        println!("{}", item);
                        if !item.active {
                            println!("(deleted)");
                        }
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
                }
                Ok(())
            }

            ItemSubcommand::List {
                patient,
                title,
                day,
                meal_type,
                format,
            } => {
                let items = match (day, meal_type) {
                    (Some(day), _) => service.find_by_day(*patient, title, *day).await?,
                    (None, Some(meal)) => {
                        let meal: MealType = meal.parse()?;
                        service.find_by_meal_type(*patient, title, meal).await?
                    }
                    (None, None) => service.find_plan_items(*patient, title).await?,
                };

                match format {
                    OutputFormat::Text => {
                        if items.is_empty() {
                            println!("No items found");
                        }
                        for item in &items {
                            println!("{}", item);
                        }
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                }
                Ok(())
            }

            ItemSubcommand::Titles { patient } => {
                for title in service.get_plan_titles(*patient).await? {
                    println!("{}", title);
                }
                Ok(())
            }

            ItemSubcommand::Update {
                id,
                title,
                notes,
                day,
                meal_type,
                food,
                food_name,
                quantity,
                unit,
                calories,
                proteins,
                carbs,
                fats,
                format,
            } => {
                let update = DietItemUpdate {
                    title: title.clone(),
                    notes: notes.clone(),
                    day_of_week: *day,
                    meal_type: meal_type.clone(),
                    food_id: *food,
                    food_name: food_name.clone(),
                    quantity: *quantity,
                    unit: unit.clone(),
                    calories: *calories,
                    proteins: *proteins,
                    carbs: *carbs,
                    fats: *fats,
                };

                let item = service.update(*id, update).await?;
                match format {
                    OutputFormat::Text => println!("Updated {}", item),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
                }
                Ok(())
            }

            ItemSubcommand::Delete { id } => {
                service.delete_item(*id).await?;
                println!("Deleted item {}", id);
                Ok(())
            }

            ItemSubcommand::DeletePlan { patient, title } => {
                let touched = service.delete_plan(*patient, title).await?;
                println!("Deleted {} item(s) of plan '{}'", touched, title);
                Ok(())
            }

            ItemSubcommand::Duplicate {
                patient,
                source,
                target,
            } => {
                let copies = service.duplicate_plan(*patient, source, target).await?;
                println!("Duplicated '{}' as '{}' ({} items)", source, target, copies.len());
                Ok(())
            }

            ItemSubcommand::Summary {
                patient,
                title,
                format,
            } => {
                let summary = service.get_plan_summary(*patient, title).await?;
                match format {
                    OutputFormat::Text => print_summary(&summary),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                }
                Ok(())
            }

            ItemSubcommand::BatchAdd { file } => {
                let contents = std::fs::read_to_string(file)?;
                let drafts: Vec<DietItemDraft> = serde_json::from_str(&contents)?;

                let report = service.create_batch(drafts).await;
                match report.status() {
                    BatchStatus::Created => {
                        println!("Created {} item(s)", report.created.len())
                    }
                    BatchStatus::Partial => {
                        println!(
                            "Created {} item(s), {} failed:",
                            report.created.len(),
                            report.failures.len()
                        );
                        for failure in &report.failures {
                            println!("  #{} {}: {}", failure.index, failure.label, failure.reason);
                        }
                    }
                    BatchStatus::Failed => {
                        println!("No items created:");
                        for failure in &report.failures {
                            println!("  #{} {}: {}", failure.index, failure.label, failure.reason);
                        }
                    }
                }
                Ok(())
            }

            ItemSubcommand::BatchDelete { ids } => {
                let deleted = service.delete_batch(ids).await;
                println!("Deleted {} of {} item(s)", deleted, ids.len());
                Ok(())
            }
        }
    }
}

fn print_summary(summary: &PlanSummary) {
    println!("{}", summary.title);
    println!("{}", "=".repeat(summary.title.len()));
    if let Some(notes) = &summary.notes {
        println!("Notes: {}", notes);
    }
    println!("Items: {}", summary.total_items);

    for (day, items) in &summary.items_by_day {
        let name = day_name(*day).unwrap_or("Day ?");
        println!("\n{}:", name);
        for item in items {
            println!("  {}", item);
        }
    }

    let n = &summary.total_nutrition;
    println!("\nTotals:");
    println!("  Calories: {:.1} kcal", n.total_calories);
    println!("  Proteins: {:.1} g", n.total_proteins);
    println!("  Carbs:    {:.1} g", n.total_carbs);
    println!("  Fats:     {:.1} g", n.total_fats);
    println!("  Average daily calories: {:.1} kcal", n.avg_daily_calories);
}
