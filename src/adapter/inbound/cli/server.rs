//! Lifecycle subcommands.

use tabled::{Table, Tabled};

use super::command::{CreateArgs, ListArgs};
use super::output;
use crate::application::server::ServerService;
use crate::domain::id::ServerId;
use crate::domain::server::Server;
use crate::error::Result;
use crate::port::inbound::server::{CreateServerRequest, UpdateServerRequest};
use crate::port::outbound::orchestrator::ProvisionOptions;
use crate::port::outbound::repository::ServerFilter;

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    server_type: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Replicas")]
    replicas: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Server> for ServerRow {
    fn from(server: &Server) -> Self {
        Self {
            id: server.id().to_string(),
            name: server.name.clone(),
            server_type: server.server_type.to_string(),
            region: server.region.clone(),
            status: server.status().to_string(),
            replicas: server
                .replicas
                .map_or_else(|| "-".to_string(), |r| r.to_string()),
            created: server.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn show(server: &Server, verb: &str) {
    if output::is_json() {
        output::json_output(server);
        return;
    }
    output::success(&format!("{verb} {}", server.name));
    output::field("ID", server.id());
    output::field("Type", server.server_type);
    output::field("Region", &server.region);
    output::field("Status", output::status(server.status()));
    if let Some(reference) = &server.resource_ref {
        output::field("Resource", reference);
    }
    if let Some(replicas) = server.replicas {
        output::field("Replicas", replicas);
    }
    output::field("Created", server.created_at.to_rfc3339());
    output::field("Updated", output::muted(server.updated_at.to_rfc3339()));
}

pub async fn create(service: &ServerService, args: CreateArgs) -> Result<()> {
    let options = ProvisionOptions {
        command: args.command,
        env: args.env.into_iter().collect(),
    };
    let request =
        CreateServerRequest::new(args.name, args.server_type, args.region).with_options(options);
    let server = service.create_server(request).await?;
    show(&server, "Created");
    Ok(())
}

pub async fn list(service: &ServerService, args: ListArgs) -> Result<()> {
    let filter = ServerFilter {
        server_type: args.server_type,
        region: args.region,
        status: args.status,
        limit: args.limit,
        offset: args.offset,
    };
    let servers = service.list_servers(&filter).await?;

    if output::is_json() {
        output::json_output(&servers);
        return Ok(());
    }
    if servers.is_empty() {
        output::note("No servers");
        return Ok(());
    }
    let rows: Vec<ServerRow> = servers.iter().map(ServerRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

pub async fn get(service: &ServerService, id: &str) -> Result<()> {
    let server = service.get_server(&ServerId::new(id)).await?;
    show(&server, "Server");
    Ok(())
}

pub async fn rename(service: &ServerService, id: &str, name: String) -> Result<()> {
    let patch = UpdateServerRequest { name: Some(name) };
    let server = service.update_server(&ServerId::new(id), patch).await?;
    show(&server, "Renamed to");
    Ok(())
}

pub async fn start(service: &ServerService, id: &str) -> Result<()> {
    let server = service.start_server(&ServerId::new(id)).await?;
    show(&server, "Started");
    Ok(())
}

pub async fn stop(service: &ServerService, id: &str) -> Result<()> {
    let server = service.stop_server(&ServerId::new(id)).await?;
    show(&server, "Stopped");
    Ok(())
}

pub async fn restart(service: &ServerService, id: &str) -> Result<()> {
    let server = service.restart_server(&ServerId::new(id)).await?;
    show(&server, "Restarted");
    Ok(())
}

pub async fn delete(service: &ServerService, id: &str) -> Result<()> {
    let id = ServerId::new(id);
    service.delete_server(&id).await?;
    if output::is_json() {
        output::json_output(&serde_json::json!({ "id": id, "deleted": true }));
    } else {
        output::success(&format!("Deleted {id}"));
    }
    Ok(())
}

pub async fn scale(service: &ServerService, id: &str, replicas: i32) -> Result<()> {
    let server = service.scale_server(&ServerId::new(id), replicas).await?;
    show(&server, &format!("Scaled to {replicas} replicas:"));
    Ok(())
}
