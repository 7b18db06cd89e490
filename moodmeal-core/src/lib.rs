//! MoodMeal Core Library
//!
//! Daily log models, the month cache, calendar grid, count-based edit
//! reconciliation and the store contract shared by MoodMeal front ends.

pub mod cache;
pub mod calendar;
pub mod date_key;
pub mod edit;
pub mod models;
pub mod store;
pub mod view;

pub use cache::{DateRange, LogCache};
pub use calendar::{build, build_grid, CalendarCell, CalendarError, DayCell, Month, WeekStart};
pub use date_key::{DateKey, DateKeyError};
pub use edit::{reconcile, EditBuffer};
pub use models::{
    DailyLog, MealEntry, MealType, MealTypeError, NutrientTotals, ValidationError,
};
pub use store::{DailyLogStore, MemoryStore, RetryPolicy, RetryingStore, StoreError};
pub use view::{CalendarView, Direction, FetchOutcome, FetchTicket, SaveError, SaveTicket};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
