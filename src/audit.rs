use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{error::AppResult, models::AuditLog, repository::Repository};

/// Entries kept in `audit_logs`; older ones are dropped on append.
pub const AUDIT_RETENTION: usize = 10_000;

#[derive(Clone)]
pub struct AuditLogger {
    logs: Arc<Repository<AuditLog>>,
    retention: usize,
}

impl AuditLogger {
    pub fn new(logs: Repository<AuditLog>) -> Self {
        Self {
            logs: Arc::new(logs),
            retention: AUDIT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()> {
        self.logs
            .append_bounded(
                AuditLog {
                    id: Uuid::new_v4(),
                    user_id,
                    action: action.to_string(),
                    resource: resource.map(str::to_string),
                    metadata,
                    created_at: Utc::now(),
                },
                self.retention,
            )
            .await?;
        Ok(())
    }

    /// Like [`log_audit`](Self::log_audit) but a failure is only logged.
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: &str,
        metadata: Value,
    ) {
        if let Err(err) = self
            .log_audit(user_id, action, Some(resource), Some(metadata))
            .await
        {
            tracing::warn!(error = %err, action, "audit log failed");
        }
    }

    pub async fn entries(&self) -> AppResult<Vec<AuditLog>> {
        Ok(self.logs.all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::JsonStore;

    #[tokio::test]
    async fn old_entries_roll_off() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let audit = AuditLogger::new(Repository::new(JsonStore::new(dir.path()))).with_retention(2);

        for action in ["login", "register", "checkout"] {
            audit.record(None, action, "users", Value::Null).await;
        }

        let actions: Vec<String> = audit.entries().await?.into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["register", "checkout"]);
        Ok(())
    }
}
