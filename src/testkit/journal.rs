//! One ordered log shared by the scripted backend and a recording
//! repository, so tests can see how storage writes and backend calls
//! interleave.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::orchestrator::Call;
use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerStatus};
use crate::error::Result;
use crate::port::outbound::repository::{ServerFilter, ServerRepository};

/// A repository write, keyed by server name where the write carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Insert(String),
    Update(String, ServerStatus),
    Tombstone(ServerId),
}

/// One journal entry, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A backend call started.
    Begin(Call),
    /// A backend call returned.
    End(Call),
    Stored(Write),
}

#[derive(Debug, Default)]
pub struct Journal {
    events: Mutex<Vec<Event>>,
}

impl Journal {
    pub fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

/// [`ServerRepository`] that journals every successful write of the
/// repository it wraps. Reads pass through unrecorded.
pub struct RecordingServerRepository {
    inner: Arc<dyn ServerRepository>,
    journal: Arc<Journal>,
}

impl RecordingServerRepository {
    pub fn new(inner: Arc<dyn ServerRepository>, journal: Arc<Journal>) -> Self {
        Self { inner, journal }
    }
}

#[async_trait]
impl ServerRepository for RecordingServerRepository {
    async fn create(&self, server: &Server) -> Result<()> {
        self.inner.create(server).await?;
        self.journal
            .push(Event::Stored(Write::Insert(server.name.clone())));
        Ok(())
    }

    async fn get_by_id(&self, id: &ServerId) -> Result<Option<Server>> {
        self.inner.get_by_id(id).await
    }

    async fn list(&self, filter: &ServerFilter) -> Result<Vec<Server>> {
        self.inner.list(filter).await
    }

    async fn update(&self, server: &Server) -> Result<()> {
        self.inner.update(server).await?;
        self.journal.push(Event::Stored(Write::Update(
            server.name.clone(),
            server.status(),
        )));
        Ok(())
    }

    async fn delete(&self, id: &ServerId) -> Result<()> {
        self.inner.delete(id).await?;
        self.journal.push(Event::Stored(Write::Tombstone(id.clone())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryServerRepository;
    use crate::domain::server::ServerType;

    #[tokio::test]
    async fn records_writes_but_not_reads() {
        let journal = Arc::new(Journal::default());
        let repo = RecordingServerRepository::new(
            Arc::new(MemoryServerRepository::new()),
            journal.clone(),
        );
        let mut server = Server::new("vpn-1", ServerType::Vpn, "us").unwrap();

        repo.create(&server).await.unwrap();
        repo.get_by_id(server.id()).await.unwrap();
        server.transition(ServerStatus::Running).unwrap();
        repo.update(&server).await.unwrap();
        repo.delete(server.id()).await.unwrap();

        assert_eq!(
            journal.events(),
            vec![
                Event::Stored(Write::Insert("vpn-1".into())),
                Event::Stored(Write::Update("vpn-1".into(), ServerStatus::Running)),
                Event::Stored(Write::Tombstone(server.id().clone())),
            ]
        );
    }
}
