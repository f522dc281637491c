use std::env;
use std::path::Path;

use quill_core::sync::{sync, HttpSyncClient, SyncOptions, SyncSummary};

use crate::commands::common::open_database;
use crate::config::{CliProfilesConfig, API_ENDPOINT_ENV, SESSION_KEY_ENV};
use crate::error::CliError;

pub async fn run_sync(
    full: bool,
    pull_only: bool,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let config = CliProfilesConfig::load()?;
    let settings = config.sync_settings(
        profile,
        env::var(API_ENDPOINT_ENV).ok(),
        env::var(SESSION_KEY_ENV).ok(),
    )?;
    tracing::debug!("Syncing with profile '{}'", settings.profile);

    let client = HttpSyncClient::new(settings.api_endpoint, settings.session_key)?;
    let mut db = open_database(db_path)?;
    let summary = sync(&mut db, &client, SyncOptions { full, pull_only }).await?;

    for line in format_summary(&summary) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_summary(summary: &SyncSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "{} sync completed at usn {}",
        if summary.full { "Full" } else { "Incremental" },
        summary.last_max_usn
    )];

    let pulled = summary.books.inserted
        + summary.books.took_server
        + summary.notes.inserted
        + summary.notes.took_server;
    if pulled > 0 {
        lines.push(format!("  pulled {pulled} changes"));
    }
    let removed = summary.cleanup.expunged + summary.cleanup.purged;
    if removed > 0 {
        lines.push(format!("  removed {removed} deleted items"));
    }
    if summary.pushed_books + summary.pushed_notes > 0 {
        lines.push(format!(
            "  pushed {} books and {} notes",
            summary.pushed_books, summary.pushed_notes
        ));
    }
    if summary.conflicts() > 0 {
        lines.push(format!(
            "  {} conflicts, see the `conflicts` book",
            summary.conflicts()
        ));
    }
    lines
}
