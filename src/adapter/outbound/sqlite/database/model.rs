//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{server_health, server_stats, servers};

/// Database row for a server.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ServerRow {
    pub id: String,
    pub name: String,
    pub server_type: String,
    pub status: String,
    pub region: String,
    pub ip: String,
    pub port: i32,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
    pub resource_ref: Option<String>,
    pub replicas: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted: i32,
    pub deleted_at: Option<String>,
}

/// Database row for a stats sample (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = server_stats)]
pub struct NewStatsRow {
    pub server_id: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub storage_usage: f64,
    pub network_in: i64,
    pub network_out: i64,
    pub uptime: i64,
    pub request_count: i64,
    pub response_time: f64,
    pub error_rate: f64,
    pub recorded_at: String,
}

/// Database row for a stats sample (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = server_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StatsRow {
    pub id: Option<i32>,
    pub server_id: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub storage_usage: f64,
    pub network_in: i64,
    pub network_out: i64,
    pub uptime: i64,
    pub request_count: i64,
    pub response_time: f64,
    pub error_rate: f64,
    pub recorded_at: String,
}

/// Database row for a health verdict (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = server_health)]
pub struct NewHealthRow {
    pub server_id: String,
    pub status: String,
    pub message: String,
    /// JSON array of checks.
    pub checks: String,
    pub recorded_at: String,
}

/// Database row for a health verdict (queryable).
#[derive(Queryable, QueryableByName, Selectable, Debug, Clone)]
#[diesel(table_name = server_health)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HealthRow {
    pub id: Option<i32>,
    pub server_id: String,
    pub status: String,
    pub message: String,
    pub checks: String,
    pub recorded_at: String,
}
