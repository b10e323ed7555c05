use anyhow::anyhow;
use phishwatch_session::check::{CHECK_FAILED, CheckState};
use phishwatch_session::error::ClientError;

use crate::cli::{OutputFormat, UrlArgs};
use crate::client::{AppContext, CliError, CliResult, LOGIN_HINT, SESSION_ENDED};
use crate::output::render_check;

pub(crate) async fn handle_check(
    ctx: &AppContext,
    args: UrlArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let check = ctx.dashboard.check();
    let state = match check.check(&args.url).await {
        Ok(state) => state,
        Err(ClientError::Authentication { .. }) => {
            return Err(CliError::failure(anyhow!(LOGIN_HINT)));
        }
        Err(err) => return Err(CliError::from_client(err, CHECK_FAILED)),
    };

    let result = match &state {
        CheckState::Safe | CheckState::Unsafe => render_check(args.url.trim(), &state, format),
        CheckState::AuthError => Err(CliError::failure(anyhow!(SESSION_ENDED))),
        CheckState::GenericError(message) => Err(CliError::failure(anyhow!(message.clone()))),
        CheckState::Idle | CheckState::Checking => Err(CliError::failure(anyhow!(CHECK_FAILED))),
    };
    check.close();
    result
}
