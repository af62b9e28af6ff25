//! Notification inbox commands

use super::Context;
use crate::output::{Status, format_count, print_json};
use anyhow::Result;
use owo_colors::OwoColorize;

/// List notifications
pub async fn list(ctx: &Context, unread_only: bool) -> Result<()> {
    let api = ctx.client.notifications();
    let api = &api;
    let notifications = ctx
        .auth
        .with_auth_retry(move |token| async move { api.list(&token, unread_only).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&notifications);
    }

    Status::header("Notifications");
    if notifications.is_empty() {
        Status::info(if unread_only {
            "No unread notifications"
        } else {
            "No notifications"
        });
        return Ok(());
    }

    for n in &notifications {
        let marker = if n.read { " ".to_string() } else { "●".blue().to_string() };
        println!(
            "  {marker} {}  {}",
            n.title.bold(),
            n.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
        if let Some(body) = &n.body {
            println!("    {body}");
        }
        println!("    {}", n.id.dimmed());
    }

    let unread = notifications.iter().filter(|n| !n.read).count();
    println!();
    println!("  {} unread", format_count(unread, "notification", "notifications"));
    println!();
    Ok(())
}

/// Mark a notification as read
pub async fn mark_read(ctx: &Context, id: &str) -> Result<()> {
    let api = ctx.client.notifications();
    let api = &api;
    ctx.auth
        .with_auth_retry(move |token| async move { api.mark_read(&token, id).await })
        .await?;

    if ctx.format.is_json() {
        return print_json(&serde_json::json!({ "read": id }));
    }
    Status::success(&format!("Marked {id} as read"));
    Ok(())
}
