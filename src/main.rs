mod types;
mod tiers;
mod editor;
mod settings;
mod config;
mod web;
mod database;
mod notifications;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use editor::{EditorError, TierEditor};
use notifications::NotificationManager;
use settings::{MemorySettingsStore, RestSettingsClient, SettingsStore};
use tiers::{load_tiers_or_empty, rank_index, resolve_rank, resolve_tier, StatusBadges, TierFetch};
use types::{Tier, TierField, TierId};
use web::{start_server, AppState};

const NOTIFICATION_RETENTION_DAYS: i64 = 30;

#[derive(Parser)]
#[command(name = "tier-desk")]
#[command(version)]
#[command(about = "Rank and profit-tier resolution with an admin tier editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Use the remote settings API instead of the local database
    #[arg(long)]
    remote: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the settings and badge API server
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep settings in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Resolve the rank for a balance
    Rank {
        balance: Decimal,
    },
    /// Resolve the tier for a balance against the stored tier table
    Tier {
        balance: Decimal,
    },
    /// Show rank and tier badges for a balance
    Status {
        balance: Decimal,
    },
    /// List keys held by the local settings database
    Keys,
    /// Edit the tier table
    Tiers {
        #[command(subcommand)]
        action: TierAction,
    },
}

#[derive(Subcommand)]
enum TierAction {
    /// List tiers in canonical order
    List,
    /// Write the default tier table if none is stored
    Seed,
    /// Add a tier
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        threshold: Decimal,
        /// Daily rate as a fraction (0.02 = 2%)
        #[arg(long)]
        daily_profit: Decimal,
        #[arg(long, default_value = "1")]
        clicks: u32,
    },
    /// Remove a tier by id
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Change one field of a tier
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        field: FieldName,
        #[arg(long)]
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldName {
    Name,
    BalanceThreshold,
    DailyProfit,
    Clicks,
}

impl FieldName {
    fn parse_value(self, raw: &str) -> Result<TierField> {
        Ok(match self {
            FieldName::Name => TierField::Name(raw.to_string()),
            FieldName::BalanceThreshold => TierField::BalanceThreshold(raw.parse()?),
            FieldName::DailyProfit => TierField::DailyProfit(raw.parse()?),
            FieldName::Clicks => TierField::Clicks(raw.parse()?),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = AppConfig::load(&cli.config)?;
    if let Err(errors) = config.validate() {
        return Err(anyhow!("invalid configuration: {}", errors.join(", ")));
    }

    match cli.command {
        Commands::Serve { port, ephemeral } => {
            run_server(&config, port, ephemeral).await?;
        }
        Commands::Rank { balance } => {
            let rank = resolve_rank(balance);
            println!("{} (#{}, icon={}, class={})", rank, rank_index(balance), rank.icon, rank.class_name);
        }
        Commands::Tier { balance } => {
            let store = open_store(&config, cli.remote, true).await?;
            let tiers = load_tiers_or_empty(store.as_ref(), &config.settings.tier_key).await;
            match resolve_tier(balance, &tiers) {
                Some(tier) => println!("{}", tier),
                None => println!("no tier"),
            }
        }
        Commands::Status { balance } => {
            let store = open_store(&config, cli.remote, true).await?;
            let fetch = TierFetch::spawn(store, config.settings.tier_key.clone());
            if fetch.is_loading() {
                debug!("Waiting for tier table");
            }
            let tiers = fetch.ready().await;
            let status = StatusBadges::for_balance(balance, &tiers);
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Keys => {
            let db = open_database(&config).await?;
            for key in db.list_setting_keys().await? {
                println!("{}", key);
            }
        }
        Commands::Tiers { action } => {
            let store = open_store(&config, cli.remote, false).await?;
            run_tier_action(store, &config.settings.tier_key, action).await?;
        }
    }

    Ok(())
}

async fn open_database(config: &AppConfig) -> Result<Arc<database::Database>> {
    Ok(Arc::new(
        database::Database::new(&config.database.url, config.database.max_connections).await?,
    ))
}

async fn open_store(config: &AppConfig, remote: bool, read_only: bool) -> Result<Arc<dyn SettingsStore>> {
    if remote {
        info!("Using remote settings API at {}", config.settings.base_url);
        let client = if read_only {
            RestSettingsClient::public_only(&config.settings.base_url, config.settings.request_timeout())?
        } else {
            RestSettingsClient::new(
                &config.settings.base_url,
                config.settings.admin_key.clone(),
                config.settings.request_timeout(),
            )?
        };
        Ok(Arc::new(client))
    } else {
        let db: Arc<dyn SettingsStore> = open_database(config).await?;
        Ok(db)
    }
}

async fn run_server(config: &AppConfig, port: Option<u16>, ephemeral: bool) -> Result<()> {
    let (store, db_handle): (Arc<dyn SettingsStore>, Option<Arc<database::Database>>) = if ephemeral {
        warn!("Ephemeral mode: settings are lost on shutdown");
        (Arc::new(MemorySettingsStore::new()) as Arc<dyn SettingsStore>, None)
    } else {
        let db = open_database(config).await?;
        let removed = db.cleanup_old_notifications(NOTIFICATION_RETENTION_DAYS).await?;
        if removed > 0 {
            info!("Removed {} acknowledged notifications", removed);
        }
        (db.clone() as Arc<dyn SettingsStore>, Some(db))
    };

    if config.auth.admin_keys.is_empty() {
        warn!("No admin keys configured; POST /admin/settings will reject every request");
    }

    let notifications = Arc::new(NotificationManager::new(db_handle));
    match notifications.restore_from_database().await {
        Ok(0) => {}
        Ok(count) => info!("Restored {} notifications", count),
        Err(e) => warn!("Failed to restore notifications: {}", e),
    }
    let state = AppState::new(
        store,
        config.auth.clone(),
        notifications,
        config.settings.tier_key.clone(),
    );

    start_server(
        state,
        &config.server.host,
        port.unwrap_or(config.server.port),
        config.server.cors_allow_any,
    )
    .await
}

async fn run_tier_action(store: Arc<dyn SettingsStore>, key: &str, action: TierAction) -> Result<()> {
    let editor = TierEditor::new(store, key).with_notifications(Arc::new(NotificationManager::new(None)));
    editor.load().await?;

    match action {
        TierAction::List => {
            let view = editor.view().await;
            let mut table = view.tiers;
            tiers::sort_tiers(&mut table);
            println!("version {}", view.version);
            for tier in table {
                println!("  [{}] {}", tier.id, tier);
            }
            return Ok(());
        }
        TierAction::Seed => {
            if !editor.tiers().await.is_empty() {
                println!("tier table already present; nothing to seed");
                return Ok(());
            }
            for tier in Tier::default_table() {
                editor.add_tier(tier).await;
            }
        }
        TierAction::Add { name, threshold, daily_profit, clicks } => {
            let id = editor.add_tier(Tier::new(name, threshold, daily_profit, clicks)).await;
            println!("added tier {}", id);
        }
        TierAction::Remove { id } => {
            let removed = editor.remove_tier(&TierId::from(id)).await?;
            println!("removed {}", removed);
        }
        TierAction::Edit { id, field, value } => {
            editor.edit_tier(&TierId::from(id), field.parse_value(&value)?).await?;
        }
    }

    match editor.save().await {
        Ok(version) => {
            println!("saved version {}", version);
            for tier in editor.tiers().await {
                println!("  [{}] {}", tier.id, tier);
            }
            Ok(())
        }
        Err(e @ EditorError::Validation(_)) => {
            for field_error in e.field_errors() {
                eprintln!("  {}", field_error);
            }
            Err(anyhow!("tier table not saved: validation failed"))
        }
        Err(e) => Err(e.into()),
    }
}
