use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerStatus};
use crate::error::{Error, Result};
use crate::port::outbound::repository::{ServerFilter, ServerRepository};

#[derive(Debug)]
struct Row {
    seq: u64,
    server: Server,
}

#[derive(Debug, Default)]
struct Rows {
    next_seq: u64,
    by_id: HashMap<ServerId, Row>,
}

/// In-memory [`ServerRepository`]. Tombstoned rows are retained.
#[derive(Debug, Default)]
pub struct MemoryServerRepository {
    rows: RwLock<Rows>,
}

impl MemoryServerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, including tombstoned ones.
    #[must_use]
    pub fn all_including_deleted(&self) -> Vec<Server> {
        self.rows
            .read()
            .by_id
            .values()
            .map(|r| r.server.clone())
            .collect()
    }
}

#[async_trait]
impl ServerRepository for MemoryServerRepository {
    async fn create(&self, server: &Server) -> Result<()> {
        let mut rows = self.rows.write();
        if rows.by_id.contains_key(server.id()) {
            return Err(Error::Conflict(format!("server {} already exists", server.id())));
        }
        let seq = rows.next_seq;
        rows.next_seq += 1;
        rows.by_id.insert(
            server.id().clone(),
            Row {
                seq,
                server: server.clone(),
            },
        );
        Ok(())
    }

    async fn get_by_id(&self, id: &ServerId) -> Result<Option<Server>> {
        Ok(self
            .rows
            .read()
            .by_id
            .get(id)
            .filter(|r| !r.server.is_deleted())
            .map(|r| r.server.clone()))
    }

    async fn list(&self, filter: &ServerFilter) -> Result<Vec<Server>> {
        let rows = self.rows.read();
        let mut matched: Vec<&Row> = rows
            .by_id
            .values()
            .filter(|r| filter.matches(&r.server))
            .collect();
        matched.sort_by(|a, b| {
            b.server
                .created_at
                .cmp(&a.server.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(matched
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|r| r.server.clone())
            .collect())
    }

    async fn update(&self, server: &Server) -> Result<()> {
        let mut rows = self.rows.write();
        match rows.by_id.get_mut(server.id()) {
            Some(row) if !row.server.is_deleted() => {
                row.server = server.clone();
                Ok(())
            }
            _ => Err(Error::not_found("server", server.id().as_str())),
        }
    }

    async fn delete(&self, id: &ServerId) -> Result<()> {
        let mut rows = self.rows.write();
        let row = rows
            .by_id
            .get_mut(id)
            .filter(|r| !r.server.is_deleted())
            .ok_or_else(|| Error::not_found("server", id.as_str()))?;

        // Tombstones are only recorded from `deleting`.
        if row.server.status() != ServerStatus::Deleting {
            row.server.transition(ServerStatus::Deleting)?;
        }
        row.server.mark_deleted(Utc::now())?;
        Ok(())
    }
}
