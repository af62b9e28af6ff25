//! Macrolog CLI - log meals and track macros from the terminal

use clap::{Args, Parser, Subcommand};
use macrolog_api_client::ApiError;
use macrolog_api_client::endpoints::food_entries::MealType;
use macrolog_api_client::endpoints::profile::ProfileUpdate;
use macrolog_telemetry::{Timer, metrics};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod output;

use chrono::{DateTime, Local, NaiveDate, Utc};
use commands::{Context, account, achievements, entries, notifications, profile};
use config::{Overrides, Settings};
use output::OutputFormat;

/// Nutrition tracker CLI for the Macrolog backend
#[derive(Parser)]
#[command(name = "macrolog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Config file (defaults to .macrolog.toml, macrolog.toml or the user config dir)
    #[arg(long, global = true, env = "MACROLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Where the session tokens are stored
    #[arg(long, global = true, env = "MACROLOG_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Backend base URL, overriding config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print collected metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login(Credentials),

    /// Create an account and log in
    Signup {
        #[command(flatten)]
        credentials: Credentials,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show whether you are logged in
    Status,

    /// Manage the food log
    Entries {
        #[command(subcommand)]
        action: EntriesAction,
    },

    /// List achievements and progress
    Achievements,

    /// Read notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },

    /// View or change profile and daily goals
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Args)]
struct Credentials {
    /// Account email
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(short, long, env = "MACROLOG_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum EntriesAction {
    /// List entries with daily totals
    List {
        /// Day to list (YYYY-MM-DD)
        #[arg(short, long, conflicts_with = "all")]
        date: Option<NaiveDate>,

        /// List every entry instead of today's
        #[arg(short, long)]
        all: bool,
    },

    /// Show one entry
    Show {
        /// Entry id
        id: String,
    },

    /// Log a food
    Add {
        /// What you ate
        food_name: String,

        #[command(flatten)]
        fields: EntryFieldArgs,

        /// When it was eaten (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Change an entry
    Update {
        /// Entry id
        id: String,

        /// New food name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: EntryFieldArgs,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: String,
    },
}

#[derive(Args)]
struct EntryFieldArgs {
    /// Calories (kcal)
    #[arg(long)]
    calories: Option<f64>,

    /// Protein (g)
    #[arg(long)]
    protein: Option<f64>,

    /// Carbohydrates (g)
    #[arg(long)]
    carbs: Option<f64>,

    /// Fats (g)
    #[arg(long)]
    fats: Option<f64>,

    /// Serving size, e.g. "1 cup"
    #[arg(short, long)]
    serving: Option<String>,

    /// Meal (breakfast, lunch, dinner, snack)
    #[arg(short, long)]
    meal: Option<MealType>,
}

impl From<EntryFieldArgs> for entries::EntryFields {
    fn from(args: EntryFieldArgs) -> Self {
        Self {
            calories: args.calories,
            protein: args.protein,
            carbs: args.carbs,
            fats: args.fats,
            serving_size: args.serving,
            meal_type: args.meal,
        }
    }
}

#[derive(Subcommand)]
enum NotificationsAction {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },

    /// Mark a notification as read
    Read {
        /// Notification id
        id: String,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show profile and goals
    Show,

    /// Update profile fields
    Set {
        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Daily calorie goal (kcal)
        #[arg(long)]
        calories: Option<u32>,

        /// Daily protein goal (g)
        #[arg(long)]
        protein: Option<f64>,

        /// Daily carbohydrate goal (g)
        #[arg(long)]
        carbs: Option<f64>,

        /// Daily fat goal (g)
        #[arg(long)]
        fats: Option<f64>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Signup { .. } => "signup",
            Self::Logout => "logout",
            Self::Status => "status",
            Self::Entries { .. } => "entries",
            Self::Achievements => "achievements",
            Self::Notifications { .. } => "notifications",
            Self::Profile { .. } => "profile",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = Overrides {
        config_file: cli.config.as_deref(),
        api_url: cli.api_url.as_deref(),
        session_file: cli.session_file.as_deref(),
        verbose: cli.verbose,
    };

    let settings = match Settings::resolve(&overrides) {
        Ok(settings) => settings,
        Err(e) => return report(&e),
    };

    let _telemetry = match macrolog_telemetry::init_with_config(settings.telemetry.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {e}", "Warning:".yellow().bold());
            None
        }
    };

    let ctx = match Context::new(&settings, cli.format) {
        Ok(ctx) => ctx,
        Err(e) => return report(&e),
    };

    let command_name = cli.command.name();
    let timer = Timer::start(format!("command.{command_name}"));
    let session_file = settings.session_path.display().to_string();
    let result = run(cli.command, &ctx, session_file).await;
    timer.stop();

    let stats = ctx.auth.stats();
    metrics().increment_by("auth.operations", stats.operations);
    metrics().increment_by("auth.refreshes", stats.refreshes);
    metrics().increment_by("auth.refresh_failures", stats.refresh_failures);
    metrics().increment_by("auth.forced_logouts", stats.forced_logouts);

    if cli.metrics {
        match serde_json::to_string_pretty(&metrics().export_json()) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("{} {e}", "Warning:".yellow().bold()),
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(command: Commands, ctx: &Context, session_file: String) -> anyhow::Result<()> {
    match command {
        Commands::Login(Credentials { email, password }) => {
            account::login(ctx, &email, &password).await
        }
        Commands::Signup { credentials, name } => {
            account::signup(ctx, &credentials.email, &credentials.password, name.as_deref()).await
        }
        Commands::Logout => account::logout(ctx).await,
        Commands::Status => account::status(ctx, Some(session_file)),

        Commands::Entries { action } => match action {
            EntriesAction::List { date, all } => {
                let date = if all {
                    None
                } else {
                    Some(date.unwrap_or_else(|| Local::now().date_naive()))
                };
                entries::list(ctx, date).await
            }
            EntriesAction::Show { id } => entries::show(ctx, &id).await,
            EntriesAction::Add { food_name, fields, at } => {
                entries::add(ctx, &food_name, fields.into(), at).await
            }
            EntriesAction::Update { id, name, fields } => {
                entries::update(ctx, &id, name, fields.into()).await
            }
            EntriesAction::Delete { id } => entries::delete(ctx, &id).await,
        },

        Commands::Achievements => achievements::list(ctx).await,

        Commands::Notifications { action } => match action {
            NotificationsAction::List { unread } => notifications::list(ctx, unread).await,
            NotificationsAction::Read { id } => notifications::mark_read(ctx, &id).await,
        },

        Commands::Profile { action } => match action {
            ProfileAction::Show => profile::show(ctx).await,
            ProfileAction::Set {
                name,
                calories,
                protein,
                carbs,
                fats,
            } => {
                let changes = ProfileUpdate {
                    display_name: name,
                    daily_calorie_goal: calories,
                    protein_goal: protein,
                    carbs_goal: carbs,
                    fats_goal: fats,
                };
                profile::set(ctx, changes).await
            }
        },
    }
}

/// Print an error and pick the exit code
fn report(error: &anyhow::Error) -> ExitCode {
    eprintln!("{} {error:#}", "Error:".red().bold());

    if matches!(error.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired)) {
        eprintln!("  Run {} to sign in again.", "macrolog login".cyan());
    }
    ExitCode::FAILURE
}
