//! Food log commands

use super::Context;
use crate::output::{Status, format_count, format_grams, format_kcal, format_totals, print_json};
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use macrolog_api_client::endpoints::food_entries::{
    FoodEntry, FoodEntryUpdate, MacroTotals, MealType, NewFoodEntry,
};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Nutrition fields shared by `add` and `update`
#[derive(Debug, Clone, Default)]
pub struct EntryFields {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub serving_size: Option<String>,
    pub meal_type: Option<MealType>,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    date: Option<NaiveDate>,
    entries: &'a [FoodEntry],
    totals: MacroTotals,
}

/// List entries for a day (or all), grouped by meal with totals
pub async fn list(ctx: &Context, date: Option<NaiveDate>) -> Result<()> {
    let api = ctx.client.food_entries();
    let api = &api;
    let entries = ctx
        .auth
        .with_auth_retry(move |token| async move { api.list(&token, date).await })
        .await?;
    let totals = MacroTotals::from_entries(&entries);

    if ctx.format.is_json() {
        return print_json(&ListOutput {
            date,
            entries: &entries,
            totals,
        });
    }

    let title = date.map_or_else(
        || "Food log".to_string(),
        |d| format!("Food log for {}", d.format("%A, %B %-d")),
    );
    Status::header(&title);

    if entries.is_empty() {
        Status::info("Nothing logged yet");
        return Ok(());
    }

    for meal in MealType::ALL.into_iter().map(Some).chain([None]) {
        let in_meal: Vec<&FoodEntry> = entries.iter().filter(|e| e.meal_type == meal).collect();
        if in_meal.is_empty() {
            continue;
        }
        let label = meal.map_or("other", MealType::as_str);
        println!();
        println!("  {}", label.to_uppercase().cyan().bold());
        for entry in in_meal {
            print_entry_line(entry);
        }
    }

    println!();
    println!(
        "  {} {}",
        format_count(totals.entries, "entry", "entries").bold(),
        format_totals(&totals).dimmed()
    );
    println!();
    Ok(())
}

/// Show one entry
pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let api = ctx.client.food_entries();
    let api = &api;
    let entry = ctx
        .auth
        .with_auth_retry(move |token| async move { api.get(&token, id).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&entry);
    }
    print_entry_detail(&entry);
    Ok(())
}

/// Log a new entry
pub async fn add(
    ctx: &Context,
    food_name: &str,
    fields: EntryFields,
    logged_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let entry = NewFoodEntry {
        food_name: food_name.to_string(),
        calories: fields.calories,
        protein: fields.protein,
        carbs: fields.carbs,
        fats: fields.fats,
        serving_size: fields.serving_size,
        meal_type: fields.meal_type,
        logged_at,
    };

    let api = ctx.client.food_entries();
    let (api, entry) = (&api, &entry);
    let created = ctx
        .auth
        .with_auth_retry(move |token| async move { api.create(&token, entry).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&created);
    }
    Status::success(&format!(
        "Logged {} ({})",
        created.food_name.bold(),
        format_kcal(created.calories)
    ));
    println!("  id: {}", created.id.dimmed());
    Ok(())
}

/// Change fields of an existing entry
pub async fn update(
    ctx: &Context,
    id: &str,
    food_name: Option<String>,
    fields: EntryFields,
) -> Result<()> {
    let changes = FoodEntryUpdate {
        food_name,
        calories: fields.calories,
        protein: fields.protein,
        carbs: fields.carbs,
        fats: fields.fats,
        serving_size: fields.serving_size,
        meal_type: fields.meal_type,
    };
    if changes.is_empty() {
        bail!("Nothing to update; pass at least one field to change");
    }

    let api = ctx.client.food_entries();
    let (api, changes) = (&api, &changes);
    let updated = ctx
        .auth
        .with_auth_retry(move |token| async move { api.update(&token, id, changes).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&updated);
    }
    Status::success(&format!("Updated {}", updated.food_name.bold()));
    print_entry_detail(&updated);
    Ok(())
}

/// Delete an entry
pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    let api = ctx.client.food_entries();
    let api = &api;
    ctx.auth
        .with_auth_retry(move |token| async move { api.delete(&token, id).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&serde_json::json!({ "deleted": id }));
    }
    Status::success(&format!("Deleted entry {id}"));
    Ok(())
}

fn print_entry_line(entry: &FoodEntry) {
    let serving = entry
        .serving_size
        .as_deref()
        .map(|s| format!(" ({s})"))
        .unwrap_or_default();
    println!(
        "    {}{}  {}  {}",
        entry.food_name,
        serving.dimmed(),
        format_kcal(entry.calories).yellow(),
        entry.id.dimmed()
    );
}

fn print_entry_detail(entry: &FoodEntry) {
    Status::header(&entry.food_name);
    if let Some(serving) = &entry.serving_size {
        println!("  Serving:   {serving}");
    }
    if let Some(meal) = entry.meal_type {
        println!("  Meal:      {meal}");
    }
    println!("  Calories:  {}", format_kcal(entry.calories));
    println!("  Protein:   {}", format_grams(entry.protein));
    println!("  Carbs:     {}", format_grams(entry.carbs));
    println!("  Fats:      {}", format_grams(entry.fats));
    println!("  Logged:    {}", entry.logged_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Id:        {}", entry.id.dimmed());
    println!();
}
