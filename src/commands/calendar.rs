use clap::Args;
use serde::Serialize;

use moodmeal_core::{CalendarCell, CalendarView, DailyLogStore, DateKey, FetchOutcome, Month};

use super::OutputFormat;
use crate::config::Config;

const CELL_WIDTH: usize = 6;

#[derive(Args)]
pub struct CalendarCommand {
    /// Month to show (YYYY-MM), defaults to the current month
    #[arg(long, short)]
    month: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct CalendarJson<'a> {
    month: String,
    title: String,
    weekdays: [&'static str; 7],
    loaded: bool,
    cells: &'a [CalendarCell],
}

/// Totals over the days of a grid that carry data.
#[derive(Debug, Default, PartialEq)]
struct MonthSummary {
    logged_days: usize,
    meals: usize,
    water: u64,
    calories: f64,
}

fn summarize(cells: &[CalendarCell]) -> MonthSummary {
    cells
        .iter()
        .filter_map(CalendarCell::as_day)
        .filter(|d| d.has_data)
        .fold(MonthSummary::default(), |mut acc, d| {
            acc.logged_days += 1;
            acc.meals += d.meal_count;
            acc.water += u64::from(d.water_count);
            acc.calories += d.calories.unwrap_or_default();
            acc
        })
}

impl CalendarCommand {
    pub async fn run(
        &self,
        store: &dyn DailyLogStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let month = match &self.month {
            Some(m) => m.parse::<Month>()?,
            None => Month::current(),
        };

        let mut view = CalendarView::new(config.effective_user_id(), month)
            .with_week_start(config.week_start);
        let outcome = view.refresh(store).await;
        let loaded = outcome == FetchOutcome::Applied;
        if !loaded {
            eprintln!(
                "Could not load logs for {}; showing no data.",
                month.title()
            );
        }

        let cells = view.grid();

        match self.format {
            OutputFormat::Json => {
                let json = CalendarJson {
                    month: month.to_string(),
                    title: month.title(),
                    weekdays: config.week_start.labels(),
                    loaded,
                    cells: &cells,
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                print!("{}", render(&view, &cells, DateKey::today()));
            }
        }

        Ok(())
    }
}

/// Text grid: title, weekday header, one row per week, legend and summary.
fn render(view: &CalendarView, cells: &[CalendarCell], today: DateKey) -> String {
    let month = view.month();
    let width = CELL_WIDTH * 7;
    let mut out = String::new();

    out.push_str(&format!("{:^width$}\n", month.title(), width = width));
    for label in view.week_start().labels() {
        out.push_str(&format!("{:<w$}", format!(" {}", label), w = CELL_WIDTH));
    }
    out.push('\n');

    for week in cells.chunks(7) {
        let row: String = week
            .iter()
            .map(|cell| {
                let text = match cell {
                    CalendarCell::Blank => String::new(),
                    CalendarCell::Day(day) => format!(
                        "{}{:>2}{}{}",
                        if day.date == today { '>' } else { ' ' },
                        day.day,
                        if day.meal_count > 0 { 'M' } else { ' ' },
                        if day.water_count > 0 { 'W' } else { ' ' },
                    ),
                };
                format!("{:<w$}", text, w = CELL_WIDTH)
            })
            .collect();
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out.push_str("\nM = meals logged, W = water logged, > = today\n");

    let summary = summarize(cells);
    out.push_str(&format!(
        "\n{} day(s) logged: {} meal(s), {} cup(s) of water, {} kcal\n",
        summary.logged_days, summary.meals, summary.water, summary.calories
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodmeal_core::{DailyLog, MealEntry, MealType};

    fn loaded_view(logs: Vec<DailyLog>) -> CalendarView {
        let mut view = CalendarView::new(Some("user1".into()), Month::new(2024, 3).unwrap());
        let ticket = view.begin_fetch().unwrap();
        view.complete_fetch(ticket, Ok(logs));
        view
    }

    #[test]
    fn test_summarize_counts_only_days_with_data() {
        let day = |d| DateKey::from_ymd(2024, 3, d).unwrap();
        let view = loaded_view(vec![
            DailyLog::new(day(1)),
            DailyLog::new(day(2)).with_water(3),
            DailyLog::new(day(3)).with_meals(vec![
                MealEntry::new("Curry", MealType::Dinner).with_macros(650.0, 70.0, 25.0, 30.0)
            ]),
        ]);

        let summary = summarize(&view.grid());
        assert_eq!(
            summary,
            MonthSummary {
                logged_days: 2,
                meals: 1,
                water: 3,
                calories: 650.0,
            }
        );
    }

    #[test]
    fn test_summarize_large_water_counts() {
        let day = |d| DateKey::from_ymd(2024, 3, d).unwrap();
        let view = loaded_view(vec![
            DailyLog::new(day(1)).with_water(u32::MAX),
            DailyLog::new(day(2)).with_water(1),
        ]);

        let summary = summarize(&view.grid());
        assert_eq!(summary.water, u64::from(u32::MAX) + 1);
        assert_eq!(summary.logged_days, 2);
    }

    #[test]
    fn test_render_marks_days() {
        let day = |d| DateKey::from_ymd(2024, 3, d).unwrap();
        let view = loaded_view(vec![
            DailyLog::new(day(5))
                .with_meals(vec![MealEntry::placeholder(1)])
                .with_water(2),
            DailyLog::new(day(6)).with_water(1),
        ]);

        let text = render(&view, &view.grid(), day(6));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].trim(), "March 2024");
        assert!(lines[1].starts_with(" Sun"));
        // 2024-03-01 is a Friday: five blanks precede it
        assert_eq!(lines[2], format!("{}  1     2", " ".repeat(CELL_WIDTH * 5)));
        assert!(text.contains("  5MW"));
        assert!(text.contains("> 6 W"));
        assert!(text.contains("2 day(s) logged: 1 meal(s), 3 cup(s) of water, 0 kcal"));
    }
}
