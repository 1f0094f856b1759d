//! SQLite server repository.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::database::connection::DbPool;
use super::database::model::ServerRow;
use super::database::schema::servers;
use super::{decode_time, encode_time};
use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerParts, ServerStatus, Tombstone};
use crate::error::{Error, Result};
use crate::port::outbound::repository::{ServerFilter, ServerRepository};

/// SQLite-backed [`ServerRepository`]. Deletes set a tombstone flag; rows
/// are never removed.
pub struct SqliteServerRepository {
    pool: DbPool,
}

impl SqliteServerRepository {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(server: &Server) -> ServerRow {
        let tombstone = server.tombstone();
        ServerRow {
            id: server.id().to_string(),
            name: server.name.clone(),
            server_type: server.server_type.as_str().to_string(),
            status: server.status().as_str().to_string(),
            region: server.region.clone(),
            ip: server.ip.clone(),
            port: i32::from(server.port),
            cpu: server.cpu,
            memory: server.memory,
            disk: server.disk,
            network: server.network,
            resource_ref: server.resource_ref.clone(),
            replicas: server.replicas,
            created_at: encode_time(server.created_at),
            updated_at: encode_time(server.updated_at),
            deleted: i32::from(tombstone.is_deleted()),
            deleted_at: tombstone.deleted_at().map(encode_time),
        }
    }

    fn from_row(row: ServerRow) -> Result<Server> {
        let tombstone = match (row.deleted, row.deleted_at.as_deref()) {
            (0, _) => Tombstone::Live,
            (_, Some(at)) => Tombstone::Deleted { at: decode_time(at)? },
            (_, None) => Tombstone::Deleted {
                at: decode_time(&row.updated_at)?,
            },
        };
        let port = u16::try_from(row.port)
            .map_err(|_| Error::Parse(format!("port out of range: {}", row.port)))?;

        Ok(Server::from_parts(ServerParts {
            id: ServerId::from(row.id),
            server_type: row.server_type.parse().map_err(Error::Parse)?,
            status: row.status.parse().map_err(Error::Parse)?,
            name: row.name,
            region: row.region,
            ip: row.ip,
            port,
            cpu: row.cpu,
            memory: row.memory,
            disk: row.disk,
            network: row.network,
            resource_ref: row.resource_ref,
            replicas: row.replicas,
            created_at: decode_time(&row.created_at)?,
            updated_at: decode_time(&row.updated_at)?,
            tombstone,
        }))
    }

    fn load_live(conn: &mut SqliteConnection, id: &str) -> Result<Option<ServerRow>> {
        servers::table
            .find(id)
            .filter(servers::deleted.eq(0))
            .first(conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[async_trait]
impl ServerRepository for SqliteServerRepository {
    async fn create(&self, server: &Server) -> Result<()> {
        let row = Self::to_row(server);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        match diesel::insert_into(servers::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
                Error::Conflict(format!("server {} already exists", server.id())),
            ),
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &ServerId) -> Result<Option<Server>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Self::load_live(&mut conn, id.as_str())?
            .map(Self::from_row)
            .transpose()
    }

    async fn list(&self, filter: &ServerFilter) -> Result<Vec<Server>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let mut query = servers::table
            .filter(servers::deleted.eq(0))
            .into_boxed();
        if let Some(server_type) = filter.server_type {
            query = query.filter(servers::server_type.eq(server_type.as_str()));
        }
        if let Some(region) = &filter.region {
            query = query.filter(servers::region.eq(region.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(servers::status.eq(status.as_str()));
        }
        query = query
            .order(servers::created_at.desc())
            .then_order_by(diesel::dsl::sql::<diesel::sql_types::BigInt>("rowid DESC"));
        if let Some(offset) = filter.offset {
            query = query.offset(i64::try_from(offset).unwrap_or(i64::MAX));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<ServerRow> = query
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn update(&self, server: &Server) -> Result<()> {
        let row = Self::to_row(server);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let updated = diesel::update(
            servers::table
                .find(row.id.as_str())
                .filter(servers::deleted.eq(0)),
        )
        .set(&row)
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        if updated == 0 {
            return Err(Error::not_found("server", server.id().as_str()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ServerId) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        conn.transaction(|conn| {
            let row = Self::load_live(conn, id.as_str())?
                .ok_or_else(|| Error::not_found("server", id.as_str()))?;
            let mut server = Self::from_row(row)?;
            // Tombstones are only recorded from `deleting`.
            if server.status() != ServerStatus::Deleting {
                server.transition(ServerStatus::Deleting)?;
            }
            server.mark_deleted(Utc::now())?;

            diesel::update(servers::table.find(id.as_str()))
                .set(&Self::to_row(&server))
                .execute(conn)
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(())
        })
    }
}
