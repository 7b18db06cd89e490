use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;

/// One meal inside a daily log.
///
/// Macro fields missing from a stored row read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    pub meal_type: MealType,
}

impl MealEntry {
    pub fn new(name: impl Into<String>, meal_type: MealType) -> Self {
        Self {
            name: name.into(),
            calories: 0.0,
            carbs: 0.0,
            protein: 0.0,
            fat: 0.0,
            meal_type,
        }
    }

    /// Zero-macro snack named `Meal {position}` (1-based).
    pub fn placeholder(position: usize) -> Self {
        Self::new(format!("Meal {}", position), MealType::Snack)
    }

    pub fn with_macros(mut self, calories: f64, carbs: f64, protein: f64, fat: f64) -> Self {
        self.calories = calories;
        self.carbs = carbs;
        self.protein = protein;
        self.fat = fat;
        self
    }

    /// Name of the first macro field that is negative or not finite.
    pub(crate) fn invalid_field(&self) -> Option<&'static str> {
        [
            ("calories", self.calories),
            ("carbs", self.carbs),
            ("protein", self.protein),
            ("fat", self.fat),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}

impl fmt::Display for MealEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} kcal, C {} g / P {} g / F {} g",
            self.name, self.meal_type, self.calories, self.carbs, self.protein, self.fat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let meal = MealEntry::placeholder(3);
        assert_eq!(meal.name, "Meal 3");
        assert_eq!(meal.meal_type, MealType::Snack);
        assert_eq!(meal.calories, 0.0);
        assert_eq!(meal.carbs, 0.0);
        assert_eq!(meal.protein, 0.0);
        assert_eq!(meal.fat, 0.0);
    }

    #[test]
    fn test_missing_macros_default_to_zero() {
        let meal: MealEntry =
            serde_json::from_str(r#"{"name":"Toast","calories":120,"meal_type":"breakfast"}"#)
                .unwrap();
        assert_eq!(meal.calories, 120.0);
        assert_eq!(meal.fat, 0.0);
        assert_eq!(meal.meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_invalid_field() {
        let ok = MealEntry::new("Apple", MealType::Snack).with_macros(95.0, 25.0, 0.5, 0.3);
        assert_eq!(ok.invalid_field(), None);

        let negative = ok.clone().with_macros(95.0, -1.0, 0.5, 0.3);
        assert_eq!(negative.invalid_field(), Some("carbs"));

        let nan = ok.with_macros(f64::NAN, 25.0, 0.5, 0.3);
        assert_eq!(nan.invalid_field(), Some("calories"));
    }
}
