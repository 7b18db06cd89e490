mod daily_log;
mod meal_entry;
mod meal_type;
mod nutrient;

pub use daily_log::{DailyLog, ValidationError};
pub use meal_entry::MealEntry;
pub use meal_type::{MealType, MealTypeError};
pub use nutrient::NutrientTotals;
