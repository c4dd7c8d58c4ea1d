//! Site command handlers.

use serde::Serialize;
use tabled::Tabled;

use credrelay_core::{RemoteSite, USER_INFO_PATH};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct SiteEntry {
    position: usize,
    site: RemoteSite,
    user_info_url: String,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "User-info URL")]
    url: String,
}

impl From<&SiteEntry> for SiteRow {
    fn from(e: &SiteEntry) -> Self {
        Self {
            position: e.position,
            site: e.site.to_string(),
            url: e.user_info_url.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = ctx.registry()?;

    match args.command {
        SitesCommand::List => {
            let entries: Vec<SiteEntry> = registry
                .list()
                .into_iter()
                .enumerate()
                .map(|(idx, site)| SiteEntry {
                    position: idx + 1,
                    user_info_url: format!("https://{site}{USER_INFO_PATH}"),
                    site,
                })
                .collect();
            if entries.is_empty() && matches!(global.output, crate::cli::OutputFormat::Table) {
                output::print_status(
                    "No remote sites configured. Add one with: credrelay sites add <url>",
                    global.quiet,
                );
                return Ok(());
            }
            let out = output::render_list(
                &global.output,
                &entries,
                |e| SiteRow::from(e),
                |e| e.site.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Add { url } => {
            let site = RemoteSite::parse(&url)?;
            if registry.add(&url).map_err(|e| ctx.core_error(e))? {
                output::print_status(&format!("Added remote site {site}"), global.quiet);
            } else {
                output::print_status(
                    &format!("Remote site {site} is already registered"),
                    global.quiet,
                );
            }
            Ok(())
        }

        SitesCommand::Remove { url } => {
            let Ok(site) = RemoteSite::parse(&url) else {
                output::print_status(&format!("'{url}' is not a registered site"), global.quiet);
                return Ok(());
            };
            if !registry.list().contains(&site) {
                output::print_status(&format!("{site} is not a registered site"), global.quiet);
                return Ok(());
            }
            if !util::confirm(
                &format!("Remove remote site '{site}'? Logins will no longer be relayed to it."),
                global.yes,
            )? {
                return Ok(());
            }
            registry.remove(&url).map_err(|e| ctx.core_error(e))?;
            output::print_status(&format!("Removed remote site {site}"), global.quiet);
            Ok(())
        }
    }
}
