//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use phishwatch_api_models::LinkRecord;
use phishwatch_session::check::CheckState;
use phishwatch_session::filter::{
    EMPTY_FILTER_MESSAGE, URL_DISPLAY_WIDTH, block_label, safety_label, toggle_label,
    truncate_url,
};
use phishwatch_session::profile::SessionProfile;
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_links(links: &[LinkRecord], format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(links)?,
        OutputFormat::Table => links_table(links),
    };
    println!("{text}");
    Ok(())
}

pub(crate) fn render_link_state(record: &LinkRecord, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(record)?,
        OutputFormat::Table => format!("{}: {}", record.url, toggle_label(record)),
    };
    println!("{text}");
    Ok(())
}

pub(crate) fn render_profile(profile: &SessionProfile, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(&json!({
            "username": profile.username,
            "email": profile.email,
            "profileImage": profile.profile_image,
        }))?,
        OutputFormat::Table => profile_table(profile),
    };
    println!("{text}");
    Ok(())
}

pub(crate) fn render_check(url: &str, state: &CheckState, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(&json!({
            "url": url,
            "is_safe": *state == CheckState::Safe,
        }))?,
        OutputFormat::Table => state.verdict().unwrap_or_default().to_string(),
    };
    println!("{text}");
    Ok(())
}

#[must_use]
pub(crate) fn links_table(links: &[LinkRecord]) -> String {
    if links.is_empty() {
        return EMPTY_FILTER_MESSAGE.to_string();
    }
    let mut rows = vec![format!(
        "{:<24} {:<33} {:<8} STATUS",
        "DOMAIN", "URL", "SAFETY"
    )];
    rows.extend(links.iter().map(|record| {
        format!(
            "{:<24} {:<33} {:<8} {}",
            record.domain,
            truncate_url(&record.url, URL_DISPLAY_WIDTH),
            safety_label(record),
            block_label(record)
        )
    }));
    rows.join("\n")
}

#[must_use]
pub(crate) fn profile_table(profile: &SessionProfile) -> String {
    let field = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "username: {}\nemail: {}\nprofile image: {}",
        field(&profile.username),
        field(&profile.email),
        field(&profile.profile_image)
    )
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}
