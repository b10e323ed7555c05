use std::time::Duration;

use anyhow::anyhow;
use phishwatch_session::filter::LinkFilter;
use phishwatch_session::mutations::{LinkMutation, MutationOutcome};
use phishwatch_session::sync::SyncOutcome;
use tracing::debug;

use crate::cli::{LinksArgs, OutputFormat, UrlArgs};
use crate::client::{AppContext, CliError, CliResult, LOGIN_HINT, SESSION_ENDED};
use crate::output::{render_link_state, render_links};

/// How often the watch loop looks for a new snapshot.
const WATCH_CHECK_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) async fn handle_links(
    ctx: &AppContext,
    args: LinksArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let filter = LinkFilter::new(args.search.unwrap_or_default(), args.filter.into());
    if args.watch {
        return watch_links(ctx, &filter, args.count, format).await;
    }

    let outcome = ctx.dashboard.sync().refresh().await;
    ctx.settle_sync(&outcome)?;
    render_links(&ctx.dashboard.visible_links(&filter), format)
}

async fn watch_links(
    ctx: &AppContext,
    filter: &LinkFilter,
    count: Option<u32>,
    format: OutputFormat,
) -> CliResult<()> {
    if !ctx.session.is_signed_in() {
        return Err(CliError::failure(anyhow!(LOGIN_HINT)));
    }

    let sync = ctx.dashboard.sync().clone();
    let mut handle = ctx.dashboard.mount(ctx.config.poll_interval);
    let mut seen = sync.revision();
    let mut printed = 0_u32;

    let result = loop {
        for message in ctx.shell.take_errors() {
            eprintln!("error: {message}");
        }
        if ctx.shell.login_required() {
            break Err(CliError::failure(anyhow!(SESSION_ENDED)));
        }

        let revision = sync.revision();
        if revision != seen {
            seen = revision;
            if let Err(err) = render_links(&ctx.dashboard.visible_links(filter), format) {
                break Err(err);
            }
            printed += 1;
            if count.is_some_and(|limit| printed >= limit) {
                break Ok(());
            }
        }

        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                debug!(interrupted = signal.is_ok(), "watch interrupted");
                break Ok(());
            }
            () = tokio::time::sleep(WATCH_CHECK_INTERVAL) => {}
        }
    };

    handle.stop();
    result
}

pub(crate) async fn handle_toggle(
    ctx: &AppContext,
    args: UrlArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let outcome = ctx.dashboard.mutations().toggle_block(&args.url).await;
    settle_mutation(ctx, LinkMutation::ToggleBlock, outcome)?;

    let url = args.url.trim();
    match ctx
        .dashboard
        .sync()
        .links()
        .into_iter()
        .find(|record| record.url == url)
    {
        Some(record) => render_link_state(&record, format),
        None => {
            println!("{url}: toggled");
            Ok(())
        }
    }
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: UrlArgs) -> CliResult<()> {
    let outcome = ctx.dashboard.mutations().delete_link(&args.url).await;
    settle_mutation(ctx, LinkMutation::Delete, outcome)?;
    println!("{}: deleted", args.url.trim());
    Ok(())
}

fn settle_mutation(
    ctx: &AppContext,
    mutation: LinkMutation,
    outcome: MutationOutcome,
) -> CliResult<()> {
    match outcome {
        MutationOutcome::Applied { resync } => match resync {
            SyncOutcome::AuthFailed => Err(CliError::failure(anyhow!(SESSION_ENDED))),
            other => {
                for message in ctx.shell.take_errors() {
                    eprintln!("warning: {message}");
                }
                debug!(resync = ?other, "mutation applied");
                Ok(())
            }
        },
        MutationOutcome::Invalid(message) => Err(CliError::validation(message)),
        MutationOutcome::NoCredential => Err(CliError::failure(anyhow!(LOGIN_HINT))),
        MutationOutcome::AuthFailed => Err(CliError::failure(anyhow!(SESSION_ENDED))),
        MutationOutcome::Busy | MutationOutcome::AccountDeleted | MutationOutcome::Failed(_) => {
            Err(ctx.failure(mutation.rejected_message()))
        }
    }
}
