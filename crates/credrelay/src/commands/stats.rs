//! Relay statistics handler.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

use credrelay_core::TOTAL;

use crate::cli::{GlobalOpts, StatsArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct DayStats {
    date: NaiveDate,
    attempts: u64,
    successes: BTreeMap<String, u64>,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Attempts")]
    attempts: u64,
    #[tabled(rename = "Successes")]
    successes: u64,
    #[tabled(rename = "By site")]
    by_site: String,
}

impl From<&DayStats> for DayRow {
    fn from(d: &DayStats) -> Self {
        Self {
            date: d.date.to_string(),
            attempts: d.attempts,
            successes: d.successes.values().sum(),
            by_site: d
                .successes
                .iter()
                .map(|(site, n)| format!("{site}: {n}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub fn handle(ctx: &Context, args: &StatsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let min_days = args.min_days.unwrap_or(ctx.auth.stats.min_days);
    let max_days = args.max_days.unwrap_or(ctx.auth.stats.max_lookback_days);
    if max_days == 0 {
        return Err(CliError::Validation {
            field: "max-days".into(),
            reason: "must be at least 1".into(),
        });
    }

    let counters = ctx.counters();
    let mut days = Vec::new();
    for entry in counters.read_range(min_days, max_days) {
        let (date, mut counts) = entry.map_err(|e| ctx.core_error(e))?;
        let attempts = counts.remove(TOTAL).unwrap_or(0);
        days.push(DayStats {
            date,
            attempts,
            successes: counts,
        });
    }

    if days.is_empty() && matches!(global.output, crate::cli::OutputFormat::Table) {
        output::print_status(
            &format!("No relay activity recorded in the last {min_days} days"),
            global.quiet,
        );
        return Ok(());
    }

    let out = output::render_list(&global.output, &days, |d| DayRow::from(d), |d| {
        format!("{} {}", d.date, d.attempts)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
