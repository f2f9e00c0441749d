//! `pattern_observations` CRUD.

use chrono::{DateTime, Utc};
use libsql::{params, Row};
use triage_core::types::{AgentId, ObservationPayload, PatternObservation, PatternType};
use uuid::Uuid;

use crate::{type_label, Error, PatternStore, Result};

fn timestamp_of(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn datetime_of(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

fn row_to_observation(row: &Row) -> Result<PatternObservation> {
    let agent_id: String = row.get(0)?;
    let _type_label: String = row.get(1)?;
    let timestamp: i64 = row.get(2)?;
    let data_json: String = row.get(3)?;
    let payload: ObservationPayload = serde_json::from_str(&data_json)?;
    Ok(PatternObservation { agent_id: AgentId::from(agent_id), timestamp: datetime_of(timestamp), payload })
}

impl PatternStore {
    /// Record a new observation. Hard error if `observation.agent_id` does
    /// not match the tracker's own agent.
    pub async fn insert_observation(&self, observation: &PatternObservation) -> Result<()> {
        self.check_agent(&observation.agent_id)?;
        let conn = self.connect().await?;
        let id = Uuid::new_v4().to_string();
        let data_json = serde_json::to_string(&observation.payload)?;
        conn.execute(
            "INSERT INTO pattern_observations (id, agent_id, type, timestamp, data_json) VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                observation.agent_id.as_str().to_string(),
                type_label(observation.payload.kind()).to_string(),
                timestamp_of(observation.timestamp),
                data_json,
            ],
        )
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Observations for this tracker's agent, optionally filtered by type,
    /// newest first, capped at `limit`.
    pub async fn recent_observations(
        &self,
        kind: Option<PatternType>,
        limit: usize,
    ) -> Result<Vec<PatternObservation>> {
        let conn = self.connect().await?;
        let agent_id = self.agent_id.as_str().to_string();

        let mut rows = if let Some(kind) = kind {
            conn.query(
                "SELECT agent_id, type, timestamp, data_json FROM pattern_observations \
                 WHERE agent_id = ? AND type = ? ORDER BY timestamp DESC LIMIT ?",
                params![agent_id, type_label(kind).to_string(), limit as i64],
            )
            .await
            .map_err(Error::Database)?
        } else {
            conn.query(
                "SELECT agent_id, type, timestamp, data_json FROM pattern_observations \
                 WHERE agent_id = ? ORDER BY timestamp DESC LIMIT ?",
                params![agent_id, limit as i64],
            )
            .await
            .map_err(Error::Database)?
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(Error::Database)? {
            out.push(row_to_observation(&row)?);
        }
        Ok(out)
    }
}
