use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::meal_entry::MealEntry;
use super::nutrient::NutrientTotals;
use crate::date_key::DateKey;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("meal {index} ('{name}') has an invalid {field} value")]
    InvalidMacro {
        index: usize,
        name: String,
        field: &'static str,
    },
    #[error("total_{field} is {stored} but the meals sum to {expected}")]
    TotalsMismatch {
        field: &'static str,
        stored: f64,
        expected: f64,
    },
}

/// Nutrition and water record for one user on one calendar day.
///
/// The `total_*` fields are derived from `meals`; use [`DailyLog::with_meals`]
/// or [`DailyLog::recompute_totals`] rather than setting them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub date: DateKey,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_carbs: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_fat: f64,
    #[serde(default)]
    pub water_intake: u32,
}

impl DailyLog {
    pub fn new(date: DateKey) -> Self {
        Self {
            id: None,
            date,
            meals: Vec::new(),
            total_calories: 0.0,
            total_carbs: 0.0,
            total_protein: 0.0,
            total_fat: 0.0,
            water_intake: 0,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_meals(mut self, meals: Vec<MealEntry>) -> Self {
        self.meals = meals;
        self.recompute_totals();
        self
    }

    pub fn with_water(mut self, cups: u32) -> Self {
        self.water_intake = cups;
        self
    }

    pub fn totals(&self) -> NutrientTotals {
        NutrientTotals {
            calories: self.total_calories,
            carbs: self.total_carbs,
            protein: self.total_protein,
            fat: self.total_fat,
        }
    }

    pub fn recompute_totals(&mut self) {
        let totals = NutrientTotals::sum(&self.meals);
        self.total_calories = totals.calories;
        self.total_carbs = totals.carbs;
        self.total_protein = totals.protein;
        self.total_fat = totals.fat;
    }

    pub fn meal_count(&self) -> usize {
        self.meals.len()
    }

    /// True when the record carries at least one meal or one cup of water.
    /// An existing all-zero record is not activity.
    pub fn has_activity(&self) -> bool {
        !self.meals.is_empty() || self.water_intake > 0
    }

    /// Checks macro values and the totals invariant before a write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, meal) in self.meals.iter().enumerate() {
            if let Some(field) = meal.invalid_field() {
                return Err(ValidationError::InvalidMacro {
                    index,
                    name: meal.name.clone(),
                    field,
                });
            }
        }

        let expected = NutrientTotals::sum(&self.meals);
        let stored = self.totals();
        for (field, stored, expected) in [
            ("calories", stored.calories, expected.calories),
            ("carbs", stored.carbs, expected.carbs),
            ("protein", stored.protein, expected.protein),
            ("fat", stored.fat, expected.fat),
        ] {
            if stored != expected {
                return Err(ValidationError::TotalsMismatch {
                    field,
                    stored,
                    expected,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for DailyLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daily Log: {}", self.date)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Water: {} cup(s)", self.water_intake)?;
        writeln!(f, "Meals: {}", self.meals.len())?;

        for meal in &self.meals {
            writeln!(f, "  - {}", meal)?;
        }

        writeln!(f, "\nTotals: {}", self.totals())?;

        Ok(())
    }
}
