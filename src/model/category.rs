//! Budget categories kept on the master sheet.

use crate::error::Res;
use crate::model::{cell_at, Amount, Cell};
use anyhow::ensure;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One expense category and its monthly budget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct CategoryBudget {
    /// The category, e.g. `Makanan`.
    pub category_name: String,
    /// An optional sub-category, e.g. `Listrik` under `Tagihan`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_name: Option<String>,
    /// The budgeted amount.
    #[schemars(with = "f64")]
    pub budget: Amount,
}

impl CategoryBudget {
    /// Reads a (category, sub-category, budget) row. Rows without a category name are ignored.
    pub(crate) fn from_row(row: &[Cell]) -> Option<Self> {
        let category_name = cell_at(row, 0).to_trimmed();
        if category_name.is_empty() {
            return None;
        }
        let sub_category_name = Some(cell_at(row, 1).to_trimmed()).filter(|s| !s.is_empty());
        Some(Self {
            category_name,
            sub_category_name,
            budget: Amount::from_cell(cell_at(row, 2)),
        })
    }

    pub(crate) fn to_row(&self) -> Vec<String> {
        vec![
            self.category_name.trim().to_string(),
            self.sub_category_name.clone().unwrap_or_default(),
            self.budget.to_cell_string(),
        ]
    }
}

/// Everything on the master sheet: budgets, expense categories and income categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryBudgets {
    pub monthly_budget: Amount,
    pub daily_budget: Amount,
    pub categories: Vec<CategoryBudget>,
    pub income_categories: Vec<String>,
}

/// Replaces the budgets and categories on the master sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SaveCategories {
    /// The monthly budget.
    #[schemars(with = "f64")]
    pub monthly_budget: Amount,
    /// The daily budget.
    #[schemars(with = "f64")]
    pub daily_budget: Amount,
    /// The full list of expense categories. Existing categories not in this list are removed.
    #[serde(default)]
    pub categories: Vec<CategoryBudget>,
    /// When present, replaces the income category list. When absent, it is left alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_categories: Option<Vec<String>>,
}

impl SaveCategories {
    pub(crate) fn validate(&self) -> Res<()> {
        ensure!(
            !self.monthly_budget.is_negative(),
            "monthly_budget cannot be negative"
        );
        ensure!(
            !self.daily_budget.is_negative(),
            "daily_budget cannot be negative"
        );
        for (ix, category) in self.categories.iter().enumerate() {
            ensure!(
                !category.category_name.trim().is_empty(),
                "Category {} has an empty category_name",
                ix + 1
            );
            ensure!(
                !category.budget.is_negative(),
                "Category '{}' has a negative budget",
                category.category_name
            );
        }
        if let Some(income) = &self.income_categories {
            ensure!(
                income.iter().all(|name| !name.trim().is_empty()),
                "Income category names cannot be empty"
            );
        }
        Ok(())
    }
}

/// Reads a single-column list of names, skipping blanks.
pub(crate) fn names_from_rows(rows: &[Vec<Cell>]) -> Vec<String> {
    rows.iter()
        .map(|row| cell_at(row, 0).to_trimmed())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row() {
        let row = vec![
            Cell::from("Tagihan"),
            Cell::from("Listrik"),
            Cell::from("Rp 400.000"),
        ];
        let category = CategoryBudget::from_row(&row).unwrap();
        assert_eq!(category.category_name, "Tagihan");
        assert_eq!(category.sub_category_name.as_deref(), Some("Listrik"));
        assert_eq!(category.budget, Amount::from(400_000));
        assert_eq!(category.to_row(), vec!["Tagihan", "Listrik", "400000"]);
    }

    #[test]
    fn test_from_row_without_sub_category() {
        let row = vec![Cell::from("Makanan"), Cell::Empty, Cell::from("Rp 1.500.000")];
        let category = CategoryBudget::from_row(&row).unwrap();
        assert_eq!(category.sub_category_name, None);
        assert!(CategoryBudget::from_row(&[Cell::from("  ")]).is_none());
    }

    #[test]
    fn test_validate_save() {
        let mut save = SaveCategories {
            monthly_budget: Amount::from(5_000_000),
            daily_budget: Amount::from(150_000),
            categories: vec![CategoryBudget {
                category_name: "Makanan".into(),
                sub_category_name: None,
                budget: Amount::from(1_000_000),
            }],
            income_categories: None,
        };
        assert!(save.validate().is_ok());
        save.categories[0].category_name = String::new();
        assert!(save.validate().is_err());
    }

    #[test]
    fn test_deserialize_save_from_json() {
        let json = r#"{
            "monthly_budget": 5000000,
            "daily_budget": 150000,
            "categories": [{"category_name": "Makanan", "budget": 1500000}]
        }"#;
        let save: SaveCategories = serde_json::from_str(json).unwrap();
        assert_eq!(save.categories.len(), 1);
        assert_eq!(save.income_categories, None);
        assert_eq!(save.daily_budget, Amount::from(150_000));
    }

    #[test]
    fn test_names_from_rows() {
        let rows = vec![
            vec![Cell::from("Gaji")],
            vec![],
            vec![Cell::from(" Bonus ")],
        ];
        assert_eq!(names_from_rows(&rows), vec!["Gaji", "Bonus"]);
    }
}
