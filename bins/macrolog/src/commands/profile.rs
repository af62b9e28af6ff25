//! Profile commands

use super::Context;
use crate::output::{Status, format_grams, print_json};
use anyhow::{Result, bail};
use macrolog_api_client::endpoints::profile::{Profile, ProfileUpdate};

/// Show the profile and daily goals
pub async fn show(ctx: &Context) -> Result<()> {
    let api = ctx.client.profile();
    let api = &api;
    let profile = ctx
        .auth
        .with_auth_retry(move |token| async move { api.get(&token).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&profile);
    }
    print_profile(&profile);
    Ok(())
}

/// Update display name or goals
pub async fn set(ctx: &Context, changes: ProfileUpdate) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to update; pass at least one field to change");
    }

    let api = ctx.client.profile();
    let (api, changes) = (&api, &changes);
    let profile = ctx
        .auth
        .with_auth_retry(move |token| async move { api.update(&token, changes).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&profile);
    }
    Status::success("Profile updated");
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &Profile) {
    Status::header(profile.display_name.as_deref().unwrap_or(&profile.email));
    println!("  Email:     {}", profile.email);
    let calories = profile
        .daily_calorie_goal
        .map_or_else(|| "-".to_string(), |c| format!("{c} kcal"));
    println!("  Calories:  {calories}");
    println!("  Protein:   {}", format_grams(profile.protein_goal));
    println!("  Carbs:     {}", format_grams(profile.carbs_goal));
    println!("  Fats:      {}", format_grams(profile.fats_goal));
    println!();
}
