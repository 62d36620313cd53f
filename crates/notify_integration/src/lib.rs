use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use shared::domain::{FacilityId, NotifyMode, RequestId, TriageAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    pub client_name: String,
    pub contact: String,
}

#[derive(Debug, Clone)]
pub struct NotifyContext {
    pub request_id: RequestId,
    pub facility_id: FacilityId,
    pub action: TriageAction,
    pub pet_name: String,
    pub appointment_at: DateTime<Utc>,
}

/// Boundary to the text/email provider. Callers pass the target contact, the
/// requested mode, and the triaged request's context; delivery semantics
/// beyond a single dispatch attempt are the provider's concern.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        target: &NotifyTarget,
        mode: NotifyMode,
        context: &NotifyContext,
    ) -> anyhow::Result<()>;
}

/// Stand-in until a real provider is wired up: logs the dispatch and reports
/// success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyDispatcher;

#[async_trait]
impl NotificationDispatcher for LogOnlyDispatcher {
    async fn dispatch(
        &self,
        target: &NotifyTarget,
        mode: NotifyMode,
        context: &NotifyContext,
    ) -> anyhow::Result<()> {
        info!(
            request_id = context.request_id.0,
            facility_id = context.facility_id.0,
            contact = %target.contact,
            mode = ?mode,
            action = ?context.action,
            "notification dispatch (log-only)"
        );
        Ok(())
    }
}
