use clap::{Args, Subcommand};

use moodmeal_core::{
    CalendarView, DailyLog, DailyLogStore, DateKey, EditBuffer, FetchOutcome, Month,
};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct DayCommand {
    #[command(subcommand)]
    pub command: DaySubcommand,
}

#[derive(Subcommand)]
pub enum DaySubcommand {
    /// Show the log for one day
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change the meal and water counts for one day
    Set {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,

        /// Set the number of meals
        #[arg(long)]
        meals: Option<u32>,

        /// Set the cups of water
        #[arg(long)]
        water: Option<u32>,

        /// Add meals to the current count
        #[arg(long, value_name = "N")]
        add_meals: Option<u32>,

        /// Remove meals from the current count (never below zero)
        #[arg(long, value_name = "N")]
        remove_meals: Option<u32>,

        /// Add cups of water to the current count
        #[arg(long, value_name = "N")]
        add_water: Option<u32>,

        /// Remove cups of water from the current count (never below zero)
        #[arg(long, value_name = "N")]
        remove_water: Option<u32>,
    },
}

/// Largest meal count a single day may hold.
const MAX_MEALS: u32 = 50;
/// Largest water count, in cups, a single day may hold.
const MAX_WATER: u32 = 1000;

/// Count changes requested on the command line, applied in field order.
#[derive(Debug, Default, Clone, PartialEq)]
struct CountChanges {
    meals: Option<u32>,
    water: Option<u32>,
    add_meals: u32,
    remove_meals: u32,
    add_water: u32,
    remove_water: u32,
}

impl CountChanges {
    /// Rejects flag values no real day reaches before any work is done.
    fn check(&self) -> Result<(), String> {
        let limits = [
            ("--meals", self.meals.unwrap_or(0), MAX_MEALS),
            ("--add-meals", self.add_meals, MAX_MEALS),
            ("--remove-meals", self.remove_meals, MAX_MEALS),
            ("--water", self.water.unwrap_or(0), MAX_WATER),
            ("--add-water", self.add_water, MAX_WATER),
            ("--remove-water", self.remove_water, MAX_WATER),
        ];
        for (flag, value, max) in limits {
            if value > max {
                return Err(format!("{} {} is too large (at most {})", flag, value, max));
            }
        }
        Ok(())
    }

    fn apply(&self, buffer: &mut EditBuffer) {
        if let Some(meals) = self.meals {
            buffer.set_meals(meals);
        }
        if let Some(water) = self.water {
            buffer.set_water(water);
        }
        for _ in 0..self.add_meals {
            buffer.increment_meals();
        }
        for _ in 0..self.remove_meals {
            buffer.decrement_meals();
        }
        for _ in 0..self.add_water {
            buffer.increment_water();
        }
        for _ in 0..self.remove_water {
            buffer.decrement_water();
        }
    }
}

/// Rejects edits that grow a day past the limits. Days already over a
/// limit may still shrink or keep their count.
fn check_totals(buffer: &EditBuffer, before: Option<&DailyLog>) -> Result<(), String> {
    let meals_before = before.map_or(0, |l| l.meals.len());
    let water_before = before.map_or(0, |l| l.water_intake);
    let meals = buffer.pending_meal_count();
    if meals > MAX_MEALS && meals as usize > meals_before {
        return Err(format!(
            "A day can hold at most {} meals, this change would leave {}",
            MAX_MEALS, meals
        ));
    }
    let water = buffer.pending_water_count();
    if water > MAX_WATER && water > water_before {
        return Err(format!(
            "A day can hold at most {} cups of water, this change would leave {}",
            MAX_WATER, water
        ));
    }
    Ok(())
}

fn parse_date(date: &Option<String>) -> Result<DateKey, Box<dyn std::error::Error>> {
    match date {
        Some(d) => Ok(d.parse()?),
        None => Ok(DateKey::today()),
    }
}

/// Opens a view on the month containing `date` and loads it.
async fn load_month(
    store: &dyn DailyLogStore,
    config: &Config,
    date: DateKey,
) -> Result<CalendarView, Box<dyn std::error::Error>> {
    let month = Month::of(date);
    let mut view = CalendarView::new(config.effective_user_id(), month)
        .with_week_start(config.week_start);

    if view.user_id().is_none() {
        return Err("Please log in to view your days. Set user_id or pass --user.".into());
    }
    if view.refresh(store).await != FetchOutcome::Applied {
        return Err(format!(
            "Could not load logs for {}. Please try again.",
            month.title()
        )
        .into());
    }

    Ok(view)
}

impl DayCommand {
    pub async fn run(
        &self,
        store: &dyn DailyLogStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DaySubcommand::Show { date, format } => {
                let date = parse_date(date)?;
                let view = load_month(store, config, date).await?;
                self.show(view.log_for(&date), date, format, config)
            }
            DaySubcommand::Set {
                date,
                meals,
                water,
                add_meals,
                remove_meals,
                add_water,
                remove_water,
            } => {
                let changes = CountChanges {
                    meals: *meals,
                    water: *water,
                    add_meals: add_meals.unwrap_or(0),
                    remove_meals: remove_meals.unwrap_or(0),
                    add_water: add_water.unwrap_or(0),
                    remove_water: remove_water.unwrap_or(0),
                };
                self.set(store, config, parse_date(date)?, &changes).await
            }
        }
    }

    fn show(
        &self,
        log: Option<&DailyLog>,
        date: DateKey,
        format: &OutputFormat,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&log)?);
            }
            OutputFormat::Text => match log {
                Some(log) => print_log_details(log, config.water_goal),
                None => println!("No activity recorded for {}", date),
            },
        }
        Ok(())
    }

    async fn set(
        &self,
        store: &dyn DailyLogStore,
        config: &Config,
        date: DateKey,
        changes: &CountChanges,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut view = load_month(store, config, date).await?;

        let before = view.log_for(&date).cloned();
        changes.check()?;
        let buffer = view.select_day(date);
        changes.apply(buffer);
        check_totals(buffer, before.as_ref())?;

        let saved = view.save(store).await?;

        let before_meals = before.as_ref().map_or(0, |l| l.meals.len());
        if saved.meals.len() < before_meals {
            println!(
                "Removed {} meal(s) from the end of the day.",
                before_meals - saved.meals.len()
            );
        }
        println!("Saved {}:", date);
        println!();
        print_log_details(&saved, config.water_goal);

        Ok(())
    }
}

fn print_log_details(log: &DailyLog, water_goal: u32) {
    println!("  Date: {}", log.date);
    println!("  Water: {}/{} cup(s)", log.water_intake, water_goal);
    println!("  Meals: {}", log.meals.len());
    for meal in &log.meals {
        println!("    - {}", meal);
    }
    println!("  Totals: {}", log.totals());
    if let Some(id) = log.id {
        println!();
        println!("Log ID: {}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StoreKind};
    use moodmeal_core::{MealEntry, MealType, MemoryStore};
    use tempfile::tempdir;

    fn local_config() -> Config {
        let temp_dir = tempdir().unwrap();
        Config::load(Some(temp_dir.path().join("none.yaml"))).unwrap()
    }

    #[test]
    fn test_changes_apply_in_order_and_clamp() {
        let date = DateKey::from_ymd(2024, 3, 5).unwrap();
        let mut buffer = EditBuffer::start(date, None);

        CountChanges {
            meals: Some(2),
            water: Some(1),
            remove_meals: 5,
            add_water: 3,
            ..CountChanges::default()
        }
        .apply(&mut buffer);

        assert_eq!(buffer.pending_meal_count(), 0);
        assert_eq!(buffer.pending_water_count(), 4);
    }

    #[tokio::test]
    async fn test_set_reconciles_against_stored_day() {
        let store = MemoryStore::new();
        let config = local_config();
        let user = config.effective_user_id().unwrap();
        let date = DateKey::from_ymd(2024, 3, 5).unwrap();
        store
            .upsert(
                &user,
                &DailyLog::new(date)
                    .with_meals(vec![MealEntry::new("Pasta", MealType::Dinner)
                        .with_macros(300.0, 40.0, 10.0, 8.0)])
                    .with_water(2),
            )
            .await
            .unwrap();

        let command = DayCommand {
            command: DaySubcommand::Show {
                date: None,
                format: OutputFormat::Text,
            },
        };
        let changes = CountChanges {
            meals: Some(3),
            water: Some(5),
            ..CountChanges::default()
        };
        command.set(&store, &config, date, &changes).await.unwrap();

        let logs = store.fetch_range(&user, date, date).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].meals.len(), 3);
        assert_eq!(logs[0].meals[2].name, "Meal 3");
        assert_eq!(logs[0].total_calories, 300.0);
        assert_eq!(logs[0].water_intake, 5);
    }

    #[tokio::test]
    async fn test_absurd_counts_are_rejected() {
        let store = MemoryStore::new();
        let config = local_config();
        let user = config.effective_user_id().unwrap();
        let date = DateKey::from_ymd(2024, 3, 5).unwrap();
        let command = DayCommand {
            command: DaySubcommand::Show {
                date: None,
                format: OutputFormat::Text,
            },
        };

        let changes = CountChanges {
            meals: Some(u32::MAX),
            ..CountChanges::default()
        };
        let err = command
            .set(&store, &config, date, &changes)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--meals 4294967295 is too large"));

        // Each flag is in range but the sum is not
        let changes = CountChanges {
            meals: Some(MAX_MEALS),
            add_meals: 1,
            ..CountChanges::default()
        };
        let err = command
            .set(&store, &config, date, &changes)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at most 50 meals"));

        assert!(store.fetch_range(&user, date, date).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_without_user_is_rejected() {
        let store = MemoryStore::new();
        let mut config = local_config();
        config.store.value = StoreKind::Remote;

        let date = DateKey::from_ymd(2024, 3, 5).unwrap();
        let err = load_month(&store, &config, date).await.unwrap_err();
        assert!(err.to_string().contains("Please log in"));
    }
}
