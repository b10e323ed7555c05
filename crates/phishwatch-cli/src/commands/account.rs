use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use phishwatch_api_models::RegisterRequest;
use phishwatch_session::account::{LOGIN_FAILED, REGISTRATION_FAILED};
use phishwatch_session::mutations::{ACCOUNT_DELETE_FAILED, MutationOutcome};

use crate::cli::{DeleteAccountArgs, LoginArgs, OutputFormat, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult, LOGIN_HINT, SESSION_ENDED};
use crate::output::render_profile;

const DELETE_PROMPT: &str = "Are you sure you want to delete your account?";

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt_line("Username: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt_secret("Password: ")?,
    };

    let profile = ctx
        .dashboard
        .account()
        .login(&username, &password)
        .await
        .map_err(|err| CliError::from_client(err, LOGIN_FAILED))?;
    let shown = if profile.username.is_empty() {
        username.trim()
    } else {
        profile.username.as_str()
    };
    println!("signed in as {shown}");
    Ok(())
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let (password, confirm_password) = register_passwords(
        args.password,
        args.confirm_password,
        io::stdin().is_terminal(),
    )?;
    let form = RegisterRequest {
        username: args.username,
        email: args.email,
        profile_image: args.profile_image,
        password,
        confirm_password,
    };

    ctx.dashboard
        .account()
        .register(form)
        .await
        .map_err(|err| CliError::from_client(err, REGISTRATION_FAILED))?;
    println!("account created; run `phishwatch login` to sign in");
    Ok(())
}

/// Resolve the password pair, prompting for whatever was not passed.
fn register_passwords(
    password: Option<String>,
    confirm: Option<String>,
    interactive: bool,
) -> CliResult<(String, String)> {
    if !interactive && (password.is_none() || confirm.is_none()) {
        return Err(CliError::validation(
            "pass both --password and --confirm-password when not on a terminal",
        ));
    }
    let password = match password {
        Some(password) => password,
        None => prompt_secret("Password: ")?,
    };
    let confirm = match confirm {
        Some(confirm) => confirm,
        None => prompt_secret("Confirm password: ")?,
    };
    Ok((password, confirm))
}

pub(crate) fn handle_logout(ctx: &AppContext) {
    ctx.dashboard.logout();
    println!("signed out");
}

pub(crate) fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    if !ctx.session.is_signed_in() {
        return Err(CliError::failure(anyhow!(LOGIN_HINT)));
    }
    render_profile(&ctx.dashboard.profile(), format)
}

pub(crate) async fn handle_delete_account(
    ctx: &AppContext,
    args: DeleteAccountArgs,
) -> CliResult<()> {
    if !args.yes && !confirm(DELETE_PROMPT)? {
        println!("account deletion cancelled");
        return Ok(());
    }

    match ctx.dashboard.mutations().delete_account().await {
        MutationOutcome::AccountDeleted => Ok(()),
        MutationOutcome::NoCredential => Err(CliError::failure(anyhow!(LOGIN_HINT))),
        MutationOutcome::AuthFailed => Err(CliError::failure(anyhow!(SESSION_ENDED))),
        MutationOutcome::Invalid(message) => Err(CliError::validation(message)),
        MutationOutcome::Busy | MutationOutcome::Applied { .. } | MutationOutcome::Failed(_) => {
            Err(ctx.failure(ACCOUNT_DELETE_FAILED))
        }
    }
}

fn confirm(question: &str) -> CliResult<bool> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "refusing to delete the account without --yes",
        ));
    }
    let answer = prompt_line(&format!("{question} [y/N] "))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn prompt_line(prompt: &str) -> CliResult<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")
        .and_then(|()| stderr.flush())
        .map_err(|err| CliError::failure(anyhow!("failed to write prompt: {err}")))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| CliError::failure(anyhow!("failed to read input: {err}")))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_secret(prompt: &str) -> CliResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))
}
