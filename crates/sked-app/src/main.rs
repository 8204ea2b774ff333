//! `sked` expands one event into the series that would be stored for it.
//!
//! Usage: `sked [FILE|-] [ACTOR]`. Reads an event (JSON) from `FILE`, or from
//! stdin when it is absent or `-`, credits new records to `ACTOR` and writes
//! them to stdout as a JSON array. Logs go to stderr.

use std::io::Read;

use anyhow::Context;
use sked_core::config::load_config;
use sked_core::types::UserId;
use sked_rrule::expand::TimeZoneResolver;
use sked_service::events::SeriesExpander;
use sked_service::identity::NewsmlGuidGenerator;
use sked_service::model::EventDraft;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let mut args = std::env::args().skip(1);
    let path = args.next().filter(|path| path != "-");
    let actor = args.next().map(UserId::from);

    let input = read_input(path.as_deref())?;
    let draft: EventDraft = serde_json::from_str(&input).context("Failed to parse event")?;

    let mut ids = NewsmlGuidGenerator::from_config(&config.identity);
    let mut resolver = TimeZoneResolver::new();
    let limit = config.recurrence.occurrence_limit();

    let prepared =
        SeriesExpander::new(&mut ids, &mut resolver, limit).prepare(&draft, actor.as_ref())?;
    if prepared.truncated {
        tracing::warn!(limit, "Series truncated");
    }
    let events = prepared.events;

    tracing::info!(occurrences = events.len(), "Expanded event");

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &events)?;
    println!();

    Ok(())
}

fn read_input(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
        }
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}
