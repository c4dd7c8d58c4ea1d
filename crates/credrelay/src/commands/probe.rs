//! One-off credential probe against a single remote site.

use secrecy::SecretString;
use serde::Serialize;

use credrelay_core::{ProbeClient, ProbeOutcome, RemoteSite};

use crate::cli::{GlobalOpts, ProbeArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ProbeReport {
    site: RemoteSite,
    url: String,
    remote_id: Option<u64>,
    email: Option<String>,
    username: Option<String>,
}

fn detail(report: &ProbeReport, color: bool) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        output::status_label("accepted", true, color),
        report.url
    );
    let dash = || "-".to_owned();
    let _ = writeln!(
        out,
        "  remote id: {}",
        report.remote_id.map_or_else(dash, |id| id.to_string())
    );
    let _ = writeln!(out, "  email:     {}", report.email.clone().unwrap_or_else(dash));
    let _ = write!(out, "  username:  {}", report.username.clone().unwrap_or_else(dash));
    out
}

fn read_password(args: &ProbeArgs) -> Result<SecretString, CliError> {
    let password = match &args.password {
        Some(pw) => pw.clone(),
        None => rpassword::prompt_password(format!("Password for {}: ", args.identifier))
            .map_err(util::prompt_err)?,
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

pub async fn handle(ctx: &Context, args: ProbeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let site = RemoteSite::parse(&args.site)?;
    let password = read_password(&args)?;

    let client = ProbeClient::new(ctx.auth.identity.clone(), &ctx.auth.transport)
        .map_err(|e| ctx.core_error(e.into()))?;
    let url = client
        .user_info_url(site.as_str())
        .map_err(|e| ctx.core_error(e.into()))?
        .to_string();

    tracing::info!(site = %site, identifier = %args.identifier, "probing remote site");
    match client.probe(site.as_str(), &args.identifier, &password).await {
        ProbeOutcome::Success(profile) => {
            let report = ProbeReport {
                site,
                url,
                remote_id: profile.id,
                email: profile.email().map(str::to_owned),
                username: profile.username().map(str::to_owned),
            };
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &report,
                |r| detail(r, color),
                |r| r.remote_id.map(|id| id.to_string()).unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ProbeOutcome::AuthRejected => Err(CliError::AuthRejected {
            site: site.to_string(),
        }),
        ProbeOutcome::UnexpectedStatus { code } => Err(CliError::UnexpectedStatus {
            site: site.to_string(),
            status: code,
        }),
        ProbeOutcome::Transport(e) if e.is_timeout() => Err(CliError::Timeout {
            site: site.to_string(),
            seconds: ctx.auth.transport.timeout.as_secs(),
        }),
        ProbeOutcome::Transport(e) => Err(CliError::ConnectionFailed {
            site: site.to_string(),
            source: Box::new(e),
        }),
    }
}
