#![allow(clippy::module_name_repetitions)]

//! # Triage Store
//!
//! The only I/O-bearing persistence in the pipeline: an embedded relational
//! pattern store (`libsql`, opened against a local file) and the per-agent
//! A/B experiment JSON state file. `triage-core` stays pure; this crate owns
//! schema creation, CRUD, and the read-modify-write discipline both forms of
//! state need.

pub mod error;
pub mod experiments;
pub mod observations;
pub mod patterns;
pub mod schema;

pub use error::{Error, Result};

use triage_core::types::{AgentId, PatternType};

pub(crate) fn type_label(kind: PatternType) -> &'static str {
    match kind {
        PatternType::TimeBased => "time_based",
        PatternType::EventBased => "event_based",
        PatternType::ContextBased => "context_based",
    }
}

/// A pattern store scoped to exactly one agent. Cheap to construct; do not
/// share one instance across agents — construct a new store per agent_id
/// instead, mirroring spec's "a tracker instance is cheap; do not share
/// across agents."
pub struct PatternStore {
    db: libsql::Database,
    agent_id: AgentId,
}

impl PatternStore {
    /// Open (creating if absent) a local pattern store file and run schema
    /// creation. `path` may be `:memory:` for tests.
    pub async fn open_local(path: impl AsRef<str>, agent_id: AgentId) -> Result<Self> {
        let db = libsql::Builder::new_local(path.as_ref()).build().await.map_err(Error::Database)?;
        let store = Self { db, agent_id };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn connect(&self) -> Result<libsql::Connection> {
        self.db.connect().map_err(Error::Database)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect().await?;
        for statement in schema::ALL_STATEMENTS {
            conn.execute(*statement, ()).await.map_err(Error::Database)?;
        }
        Ok(())
    }

    fn check_agent(&self, agent_id: &AgentId) -> Result<()> {
        if agent_id != &self.agent_id {
            return Err(Error::Core(triage_core::Error::AgentMismatch {
                tracker: self.agent_id.to_string(),
                observation: agent_id.to_string(),
            }));
        }
        Ok(())
    }

    /// The agent this store is scoped to.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }
}
