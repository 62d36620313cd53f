use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(RequestId);
id_newtype!(FacilityId);
id_newtype!(ClientId);
id_newtype!(PetId);
id_newtype!(OperatorId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Boarding,
    Daycare,
    Grooming,
    Training,
}

impl ServiceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Boarding => "boarding",
            ServiceKind::Daycare => "daycare",
            ServiceKind::Grooming => "grooming",
            ServiceKind::Training => "training",
        }
    }
}

/// The only statuses a stored request may carry. Scheduled and declined
/// requests leave the store instead of being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Waitlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageAction {
    Decline,
    Waitlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    #[default]
    None,
    Text,
    Email,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: RequestId,
    pub facility_id: FacilityId,
    pub client_id: ClientId,
    pub client_name: String,
    pub client_contact: String,
    pub pet_id: PetId,
    pub pet_name: String,
    pub services: Vec<ServiceKind>,
    pub created_at: DateTime<Utc>,
    pub appointment_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: RequestStatus,
}
