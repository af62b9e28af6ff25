//! Login, signup, logout and session status

use super::Context;
use crate::output::{Status, print_json};
use anyhow::Result;
use chrono::{DateTime, Utc};
use macrolog_api_client::{AuthState, Session};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::warn;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    state: AuthState,
    base_url: String,
    session_file: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    expired: Option<bool>,
}

/// Exchange credentials for a session and persist it
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let session = ctx.client.auth().login(email, password).await?;
    store_session(ctx, &session, email)
}

/// Create an account and persist the returned session
pub async fn signup(ctx: &Context, email: &str, password: &str, name: Option<&str>) -> Result<()> {
    let session = ctx.client.auth().signup(email, password, name).await?;
    store_session(ctx, &session, email)
}

fn store_session(ctx: &Context, session: &Session, email: &str) -> Result<()> {
    ctx.auth.sign_in(session)?;

    if ctx.format.is_json() {
        return print_json(&serde_json::json!({ "state": AuthState::Authenticated, "email": email }));
    }
    Status::success(&format!("Logged in as {}", email.bold()));
    Ok(())
}

/// Revoke the session server-side when possible, then forget it locally
pub async fn logout(ctx: &Context) -> Result<()> {
    if let Some(token) = ctx.auth.store().access_token()? {
        // Local logout must succeed even if the backend is unreachable.
        if let Err(e) = ctx.client.auth().logout(&token).await {
            warn!(error = %e, "Server-side logout failed");
        }
    }
    ctx.auth.sign_out()?;

    if ctx.format.is_json() {
        return print_json(&serde_json::json!({ "state": AuthState::LoggedOut }));
    }
    Status::success("Logged out");
    Ok(())
}

/// Show whether a session is stored; makes no network calls
pub fn status(ctx: &Context, session_file: Option<String>) -> Result<()> {
    let session = ctx.auth.store().load()?;
    let expires_at = session
        .as_ref()
        .and_then(|s| s.expires_at)
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    let output = StatusOutput {
        state: ctx.auth.state(),
        base_url: ctx.client.base_url().to_string(),
        session_file,
        expires_at,
        expired: session.as_ref().and_then(|s| s.expires_at.map(|_| s.is_expired())),
    };

    if ctx.format.is_json() {
        return print_json(&output);
    }

    Status::header("Macrolog session");
    let state = match output.state {
        AuthState::Authenticated => "✓ Logged in".green().to_string(),
        AuthState::LoggedOut => "✗ Logged out".red().to_string(),
    };
    println!("  State:    {state}");
    println!("  Backend:  {}", output.base_url);
    if let Some(path) = &output.session_file {
        println!("  Session:  {}", path.dimmed());
    }
    if let Some(at) = output.expires_at {
        let note = if output.expired == Some(true) {
            " (expired, will refresh on next request)".yellow().to_string()
        } else {
            String::new()
        };
        println!("  Expires:  {}{note}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    if output.state == AuthState::LoggedOut {
        println!();
        println!("  Run {} to sign in.", "macrolog login".cyan());
    }
    println!();
    Ok(())
}
