use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use super::meal_entry::MealEntry;

/// Componentwise macro totals over a sequence of meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

impl NutrientTotals {
    /// Sums meals in order. Summation order is fixed so every caller
    /// (reconcile, the stores, the cache) arrives at bit-identical totals.
    pub fn sum<'a>(meals: impl IntoIterator<Item = &'a MealEntry>) -> Self {
        meals
            .into_iter()
            .fold(Self::default(), |acc, meal| acc + Self::of(meal))
    }

    pub fn of(meal: &MealEntry) -> Self {
        Self {
            calories: meal.calories,
            carbs: meal.carbs,
            protein: meal.protein,
            fat: meal.fat,
        }
    }
}

impl Add for NutrientTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            carbs: self.carbs + rhs.carbs,
            protein: self.protein + rhs.protein,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for NutrientTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl fmt::Display for NutrientTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} kcal, carbs: {} g, protein: {} g, fat: {} g",
            self.calories, self.carbs, self.protein, self.fat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(NutrientTotals::sum(&Vec::<MealEntry>::new()), NutrientTotals::default());
    }

    #[test]
    fn test_sum_is_componentwise() {
        let meals = vec![
            MealEntry::new("Oats", MealType::Breakfast).with_macros(300.0, 54.0, 10.0, 5.5),
            MealEntry::new("Soup", MealType::Lunch).with_macros(220.5, 20.0, 12.0, 8.0),
        ];
        let totals = NutrientTotals::sum(&meals);

        assert_eq!(totals.calories, 520.5);
        assert_eq!(totals.carbs, 74.0);
        assert_eq!(totals.protein, 22.0);
        assert_eq!(totals.fat, 13.5);
    }

    #[test]
    fn test_display() {
        let totals = NutrientTotals {
            calories: 300.0,
            carbs: 40.0,
            protein: 15.5,
            fat: 9.0,
        };
        assert_eq!(
            totals.to_string(),
            "300 kcal, carbs: 40 g, protein: 15.5 g, fat: 9 g"
        );
    }
}
