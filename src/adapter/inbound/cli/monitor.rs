//! `stats` and `health` subcommands.

use tabled::{Table, Tabled};

use super::command::{HealthArgs, StatsArgs};
use super::output;
use crate::application::server::ServerService;
use crate::domain::id::ServerId;
use crate::domain::stats::{Observation, ServerHealth, ServerStats};
use crate::error::Result;

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU %")]
    cpu: String,
    #[tabled(rename = "Memory %")]
    memory: String,
    #[tabled(rename = "Net In")]
    network_in: u64,
    #[tabled(rename = "Net Out")]
    network_out: u64,
}

impl From<&ServerStats> for StatsRow {
    fn from(stats: &ServerStats) -> Self {
        Self {
            time: stats.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            cpu: format!("{:.1}", stats.cpu_usage),
            memory: format!("{:.1}", stats.memory_usage),
            network_in: stats.network_in,
            network_out: stats.network_out,
        }
    }
}

#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Server")]
    server_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

impl From<&ServerHealth> for HealthRow {
    fn from(health: &ServerHealth) -> Self {
        Self {
            server_id: health.server_id.to_string(),
            status: health.status.to_string(),
            message: health.message.clone(),
            checked: health.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn show_stats(stats: &ServerStats) {
    output::field("CPU", format!("{:.1}%", stats.cpu_usage));
    output::field("Memory", format!("{:.1}%", stats.memory_usage));
    output::field("Storage", format!("{:.1}%", stats.storage_usage));
    output::field("Net in", stats.network_in);
    output::field("Net out", stats.network_out);
    output::field("Sampled", output::muted(stats.timestamp.to_rfc3339()));
}

fn show_health(health: &ServerHealth) {
    output::field("Status", output::status(health.status));
    if !health.message.is_empty() {
        output::field("Message", &health.message);
    }
    for check in &health.checks {
        let mark = if check.passed { "pass" } else { "fail" };
        output::field(&check.name, format!("{mark} {}", output::muted(&check.detail)));
    }
    output::field("Checked", output::muted(health.timestamp.to_rfc3339()));
}

pub async fn stats(service: &ServerService, args: StatsArgs) -> Result<()> {
    let id = ServerId::new(args.id);

    if args.record {
        let stats = service.record_stats(&id).await?;
        if output::is_json() {
            output::json_output(&stats);
        } else {
            output::section(&format!("Stats for {id}"));
            show_stats(&stats);
        }
        return Ok(());
    }

    if let Some(limit) = args.history {
        let history = service.get_stats_history(&id, limit).await?;
        if output::is_json() {
            output::json_output(&history);
        } else if history.is_empty() {
            output::note("No stats recorded");
        } else {
            let rows: Vec<StatsRow> = history.iter().map(StatsRow::from).collect();
            output::lines(&Table::new(rows).to_string());
        }
        return Ok(());
    }

    let observation = service.get_server_stats(&id).await?;
    if output::is_json() {
        output::json_output(&observation);
        return Ok(());
    }
    output::section(&format!("Stats for {id}"));
    match &observation {
        Observation::Recorded(stats) => show_stats(stats),
        Observation::Empty => output::note("No stats recorded; run with --record to sample"),
        Observation::Unconfigured(stats) => {
            output::warning("Stats storage is not configured");
            show_stats(stats);
        }
    }
    Ok(())
}

pub async fn health(service: &ServerService, args: HealthArgs) -> Result<()> {
    let Some(id) = args.id.map(ServerId::new) else {
        return all(service).await;
    };

    let observation = if args.record {
        Observation::Recorded(service.record_health(&id).await?)
    } else {
        service.get_server_health(&id).await?
    };

    if output::is_json() {
        output::json_output(&observation);
        return Ok(());
    }
    output::section(&format!("Health of {id}"));
    match &observation {
        Observation::Recorded(health) => show_health(health),
        Observation::Empty => output::note("No health recorded; run with --record to probe"),
        Observation::Unconfigured(health) => {
            output::warning("Health storage is not configured");
            show_health(health);
        }
    }
    Ok(())
}

async fn all(service: &ServerService) -> Result<()> {
    let observation = service.get_all_servers_health().await?;
    if output::is_json() {
        output::json_output(&observation);
        return Ok(());
    }
    match observation.value() {
        Some(verdicts) if !verdicts.is_empty() => {
            let rows: Vec<HealthRow> = verdicts.iter().map(HealthRow::from).collect();
            output::lines(&Table::new(rows).to_string());
        }
        _ => output::note("No health recorded"),
    }
    Ok(())
}
