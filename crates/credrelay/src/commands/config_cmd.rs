//! Config subcommand handlers.

use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Context};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Paths {
    config: String,
    config_exists: bool,
    state: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let path = config::active_config_path(global);
            if path.exists()
                && !util::confirm(
                    &format!("Overwrite existing config at {}?", path.display()),
                    global.yes,
                )?
            {
                return Ok(());
            }
            let written = config::save_config(&Config::default(), Some(&path))?;
            output::print_status(
                &format!("Wrote default configuration to {}", written.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let ctx = Context::load(global)?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&ctx.config)
                    .map_err(|e| CliError::ConfigWrite(e.to_string()))?,
                _ => output::render_single(&global.output, &ctx.config, |_| String::new(), |_| {
                    String::new()
                }),
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let ctx = Context::load(global)?;
            let paths = Paths {
                config: ctx.config_path.display().to_string(),
                config_exists: ctx.config_path.exists(),
                state: ctx.state_path().display().to_string(),
            };
            let out = output::render_single(
                &global.output,
                &paths,
                |p| {
                    let missing = if p.config_exists { "" } else { " (not created)" };
                    format!("config: {}{missing}\nstate:  {}", p.config, p.state)
                },
                |p| p.config.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
