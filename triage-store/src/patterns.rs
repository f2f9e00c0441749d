//! `patterns` table CRUD.

use chrono::{DateTime, Utc};
use libsql::{params, Row};
use serde::{Deserialize, Serialize};
use triage_core::types::{AgentId, Pattern, PatternDescriptor, PatternId, PatternType};

use crate::{type_label, Error, PatternStore, Result};

fn timestamp_of(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn datetime_of(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Everything that isn't already a dedicated column, stored as one JSON blob
/// so adding descriptor fields never needs a migration.
#[derive(Debug, Serialize, Deserialize)]
struct PatternDataJson {
    descriptor: PatternDescriptor,
}

fn row_to_pattern(row: &Row) -> Result<Pattern> {
    let id: String = row.get(0)?;
    let agent_id: String = row.get(1)?;
    let _type_label: String = row.get(2)?;
    let description: String = row.get(3)?;
    let confidence: f64 = row.get(4)?;
    let observation_count: i64 = row.get(5)?;
    let first_observed: i64 = row.get(6)?;
    let last_observed: i64 = row.get(7)?;
    let active: i64 = row.get(8)?;
    let linked_reminder_id: Option<String> = row.get(9)?;
    let data_json: String = row.get(10)?;

    let data: PatternDataJson = serde_json::from_str(&data_json)?;

    Ok(Pattern {
        id: PatternId::from(id),
        agent_id: AgentId::from(agent_id),
        pattern_type: descriptor_kind(&data.descriptor),
        description,
        confidence,
        observation_count: observation_count as u32,
        first_observed: datetime_of(first_observed),
        last_observed: datetime_of(last_observed),
        active: active != 0,
        linked_reminder_id,
        descriptor: data.descriptor,
    })
}

fn descriptor_kind(descriptor: &PatternDescriptor) -> PatternType {
    match descriptor {
        PatternDescriptor::Time { .. } => PatternType::TimeBased,
        PatternDescriptor::Event { .. } => PatternType::EventBased,
        PatternDescriptor::Context { .. } => PatternType::ContextBased,
    }
}

impl PatternStore {
    /// Insert or fully overwrite a pattern row by id.
    pub async fn upsert_pattern(&self, pattern: &Pattern) -> Result<()> {
        self.check_agent(&pattern.agent_id)?;
        let conn = self.connect().await?;
        let data_json = serde_json::to_string(&PatternDataJson { descriptor: pattern.descriptor.clone() })?;

        conn.execute(
            "INSERT INTO patterns (
                id, agent_id, type, description, confidence, observation_count,
                first_observed, last_observed, active, linked_reminder_id, data_json, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, strftime('%s', 'now'))
            ON CONFLICT(id) DO UPDATE SET
                description = excluded.description,
                confidence = excluded.confidence,
                observation_count = excluded.observation_count,
                first_observed = excluded.first_observed,
                last_observed = excluded.last_observed,
                active = excluded.active,
                linked_reminder_id = excluded.linked_reminder_id,
                data_json = excluded.data_json,
                updated_at = strftime('%s', 'now')",
            params![
                pattern.id.as_str().to_string(),
                pattern.agent_id.as_str().to_string(),
                type_label(pattern.pattern_type).to_string(),
                pattern.description.clone(),
                pattern.confidence,
                i64::from(pattern.observation_count),
                timestamp_of(pattern.first_observed),
                timestamp_of(pattern.last_observed),
                i64::from(pattern.active),
                pattern.linked_reminder_id.clone(),
                data_json,
            ],
        )
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Fetch a single pattern by id, scoped to this tracker's agent.
    pub async fn get_pattern(&self, id: &PatternId) -> Result<Option<Pattern>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, agent_id, type, description, confidence, observation_count,
                        first_observed, last_observed, active, linked_reminder_id, data_json
                 FROM patterns WHERE id = ? AND agent_id = ?",
                params![id.as_str().to_string(), self.agent_id.as_str().to_string()],
            )
            .await
            .map_err(Error::Database)?;

        match rows.next().await.map_err(Error::Database)? {
            Some(row) => Ok(Some(row_to_pattern(&row)?)),
            None => Ok(None),
        }
    }

    /// All patterns for this tracker's agent, optionally restricted to
    /// active ones, ordered by confidence descending.
    pub async fn list_patterns(&self, active_only: bool) -> Result<Vec<Pattern>> {
        let conn = self.connect().await?;
        let agent_id = self.agent_id.as_str().to_string();

        let mut rows = if active_only {
            conn.query(
                "SELECT id, agent_id, type, description, confidence, observation_count,
                        first_observed, last_observed, active, linked_reminder_id, data_json
                 FROM patterns WHERE agent_id = ? AND active = 1 ORDER BY confidence DESC",
                params![agent_id],
            )
            .await
            .map_err(Error::Database)?
        } else {
            conn.query(
                "SELECT id, agent_id, type, description, confidence, observation_count,
                        first_observed, last_observed, active, linked_reminder_id, data_json
                 FROM patterns WHERE agent_id = ? ORDER BY confidence DESC",
                params![agent_id],
            )
            .await
            .map_err(Error::Database)?
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(Error::Database)? {
            out.push(row_to_pattern(&row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(agent: &str, id: &str) -> Pattern {
        Pattern {
            id: PatternId::from(id),
            agent_id: AgentId::from(agent),
            pattern_type: PatternType::TimeBased,
            description: "Recurring action: check email".to_string(),
            confidence: 0.6,
            observation_count: 4,
            first_observed: Utc::now(),
            last_observed: Utc::now(),
            active: true,
            linked_reminder_id: None,
            descriptor: PatternDescriptor::Time {
                typical_action: "check email".to_string(),
                time_of_day_minutes: 540,
                tolerance_minutes: 30,
                day_of_week: None,
            },
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = PatternStore::open_local(":memory:", AgentId::from("agent-1")).await.unwrap();
        let pattern = sample("agent-1", "p1");
        store.upsert_pattern(&pattern).await.unwrap();
        let fetched = store.get_pattern(&PatternId::from("p1")).await.unwrap().unwrap();
        assert_eq!(fetched.observation_count, 4);
        assert_eq!(fetched.description, "Recurring action: check email");
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_row() {
        let store = PatternStore::open_local(":memory:", AgentId::from("agent-1")).await.unwrap();
        let mut pattern = sample("agent-1", "p1");
        store.upsert_pattern(&pattern).await.unwrap();
        pattern.observation_count = 9;
        pattern.confidence = 0.9;
        store.upsert_pattern(&pattern).await.unwrap();

        let fetched = store.get_pattern(&PatternId::from("p1")).await.unwrap().unwrap();
        assert_eq!(fetched.observation_count, 9);
        assert!((fetched.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn list_patterns_filters_by_active() {
        let store = PatternStore::open_local(":memory:", AgentId::from("agent-1")).await.unwrap();
        let mut inactive = sample("agent-1", "p2");
        inactive.active = false;
        store.upsert_pattern(&sample("agent-1", "p1")).await.unwrap();
        store.upsert_pattern(&inactive).await.unwrap();

        let active = store.list_patterns(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, PatternId::from("p1"));

        let all = store.list_patterns(false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn cross_agent_upsert_is_rejected() {
        let store = PatternStore::open_local(":memory:", AgentId::from("agent-1")).await.unwrap();
        let result = store.upsert_pattern(&sample("agent-2", "p1")).await;
        assert!(result.is_err());
    }
}
