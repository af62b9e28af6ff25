//! Achievements command

use super::Context;
use crate::output::{Status, format_count, print_json};
use anyhow::Result;
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 20;

/// List achievements, unlocked first
pub async fn list(ctx: &Context) -> Result<()> {
    let api = ctx.client.achievements();
    let api = &api;
    let mut achievements = ctx
        .auth
        .with_auth_retry(move |token| async move { api.list(&token).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&achievements);
    }

    achievements.sort_by_key(|a| (!a.is_unlocked(), std::cmp::Reverse(a.percent())));
    let unlocked = achievements.iter().filter(|a| a.is_unlocked()).count();

    Status::header("Achievements");
    if achievements.is_empty() {
        Status::info("No achievements yet");
        return Ok(());
    }

    for achievement in &achievements {
        if achievement.is_unlocked() {
            println!("  {} {}", "★".yellow(), achievement.title.bold());
        } else {
            println!(
                "  {} {} {}",
                "☆".dimmed(),
                achievement.title,
                progress_bar(achievement.percent()).dimmed()
            );
        }
        if let Some(description) = &achievement.description {
            println!("    {}", description.dimmed());
        }
    }

    println!();
    println!(
        "  {} of {}",
        unlocked.to_string().green().bold(),
        format_count(achievements.len(), "achievement", "achievements")
    );
    println!();
    Ok(())
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}
