//! Terminal output helpers

use anyhow::Result;
use clap::ValueEnum;
use macrolog_api_client::endpoints::food_entries::MacroTotals;
use owo_colors::OwoColorize;
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Status message helpers
pub struct Status;

impl Status {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Format an optional gram amount, `-` when unknown
pub fn format_grams(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}g"))
}

/// Format an optional calorie amount, `-` when unknown
pub fn format_kcal(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.0} kcal"))
}

/// One-line summary of summed macros
pub fn format_totals(totals: &MacroTotals) -> String {
    format!(
        "{} · P {} · C {} · F {}",
        format_kcal(Some(totals.calories)),
        format_grams(Some(totals.protein)),
        format_grams(Some(totals.carbs)),
        format_grams(Some(totals.fats)),
    )
}
