//! Jotpad digest - scheduled news idea job
//!
//! Collects the top headline of a few news feeds, asks the model to combine
//! them into one idea, and saves and sends the result.

mod cli;
mod config;
mod error;
mod feeds;
mod llm;
mod settings;
mod supabase;
mod telegram;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use clap::Parser;

use crate::cli::Cli;
use crate::config::DigestConfig;
use crate::error::{DigestError, DigestResult};
use crate::feeds::{active_feeds, FeedClient, NewsItem};
use crate::llm::{render_prompt, AnthropicClient};
use crate::settings::{is_due, DigestSettings};
use crate::supabase::{IdeaRecord, SupabaseClient};
use crate::telegram::{format_message, TelegramClient};

/// Offset used for `generated_at` and the Telegram header (KST)
const REPORT_UTC_OFFSET_SECS: i32 = 9 * 3600;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> DigestResult<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jotpad_digest=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let config = DigestConfig::from_env()?;
    let supabase = config
        .supabase
        .as_ref()
        .map(SupabaseClient::new)
        .transpose()?;

    let settings = load_settings(supabase.as_ref()).await;
    if !settings.enabled && !cli.force {
        tracing::info!("Digest is disabled in settings; nothing to do");
        return Ok(());
    }
    if !cli.force && !run_is_due(supabase.as_ref(), &settings).await {
        return Ok(());
    }

    tracing::info!("[1/3] Collecting news");
    let feeds = active_feeds(&settings.active_sources);
    let items = FeedClient::new()?.collect(&feeds, cli.items).await;
    if items.is_empty() {
        return Err(DigestError::NoNews);
    }
    tracing::info!("Collected {} news items", items.len());

    tracing::info!("[2/3] Generating idea");
    let prompt = render_prompt(&settings.prompt_template, &items);
    let idea = AnthropicClient::new(config.anthropic.clone())?
        .generate(&prompt)
        .await?;
    let generated_at = report_time(Utc::now());

    if cli.dry_run {
        println!("{}", format_message(&items, &idea, &generated_at));
        return Ok(());
    }

    tracing::info!("[3/3] Saving and sending");
    let saved = save_idea(supabase.as_ref(), &items, &idea, generated_at).await;
    let sent = send_idea(&config, &items, &idea, &generated_at).await;
    tracing::info!(
        "Supabase: {}, Telegram: {}",
        if saved { "OK" } else { "FAIL" },
        if sent { "OK" } else { "FAIL" }
    );

    if saved || sent {
        Ok(())
    } else {
        Err(DigestError::DeliveryFailed)
    }
}

fn report_time(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
}

/// Settings from Supabase, or the defaults when unavailable
async fn load_settings(supabase: Option<&SupabaseClient>) -> DigestSettings {
    let Some(supabase) = supabase else {
        return DigestSettings::default();
    };
    match supabase.fetch_settings().await {
        Ok(Some(row)) => DigestSettings::from(row),
        Ok(None) => {
            tracing::info!("No digest settings row; using defaults");
            DigestSettings::default()
        }
        Err(e) => {
            tracing::warn!("Failed to load digest settings, using defaults: {}", e);
            DigestSettings::default()
        }
    }
}

async fn run_is_due(supabase: Option<&SupabaseClient>, settings: &DigestSettings) -> bool {
    let Some(supabase) = supabase else {
        return true;
    };
    match supabase.latest_generated_at().await {
        Ok(last_run) => {
            let due = is_due(last_run, settings.run_interval_minutes, Utc::now());
            if !due {
                tracing::info!(
                    "Last digest at {:?} is within the {} minute interval; skipping",
                    last_run,
                    settings.run_interval_minutes
                );
            }
            due
        }
        Err(e) => {
            tracing::warn!("Failed to read the last run time, running anyway: {}", e);
            true
        }
    }
}

async fn save_idea(
    supabase: Option<&SupabaseClient>,
    items: &[NewsItem],
    idea: &str,
    generated_at: DateTime<FixedOffset>,
) -> bool {
    let Some(supabase) = supabase else {
        tracing::warn!("Supabase is not configured; skipping save");
        return false;
    };
    let record = IdeaRecord {
        generated_at,
        news_items: items,
        idea,
    };
    match supabase.insert_idea(&record).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to save idea: {}", e);
            false
        }
    }
}

async fn send_idea(
    config: &DigestConfig,
    items: &[NewsItem],
    idea: &str,
    generated_at: &DateTime<FixedOffset>,
) -> bool {
    let Some(telegram) = config.telegram.clone() else {
        tracing::warn!("Telegram is not configured; skipping send");
        return false;
    };
    let message = format_message(items, idea, generated_at);
    let result = match TelegramClient::new(telegram) {
        Ok(client) => client.send(&message).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to send idea to Telegram: {}", e);
            false
        }
    }
}
