use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        BookingRequest, ClientId, FacilityId, NotifyMode, PetId, RequestId, ServiceKind,
        TriageAction,
    },
    error::ApiError,
};

/// Inbound submission payload, as delivered by the customer-facing booking
/// flow. The store stamps `created_at` and allocates the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    pub facility_id: FacilityId,
    pub client_id: ClientId,
    pub client_name: String,
    pub client_contact: String,
    pub pet_id: PetId,
    pub pet_name: String,
    pub services: Vec<ServiceKind>,
    pub appointment_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    AppointmentAt,
    ClientName,
    PetName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageQuery {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub dir: SortDir,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub request_id: RequestId,
    pub client_id: ClientId,
    pub pet_id: PetId,
    pub service: ServiceKind,
    pub appointment_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedDraft {
    pub draft: ScheduleDraft,
    pub replaced: bool,
}

/// Serializable view of a triage flow, as reported back to the operator UI
/// after each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FlowStage {
    Idle,
    Confirming {
        action: TriageAction,
        request_id: RequestId,
    },
    Notifying {
        action: TriageAction,
        request_id: RequestId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReceipt {
    pub action: TriageAction,
    pub request_id: RequestId,
    pub notify_mode: NotifyMode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    RequestSubmitted {
        request: BookingRequest,
    },
    RequestDeclined {
        request_id: RequestId,
        facility_id: FacilityId,
    },
    RequestWaitlisted {
        request: BookingRequest,
    },
    DraftStaged {
        draft: ScheduleDraft,
        replaced: bool,
    },
    Error(ApiError),
}
