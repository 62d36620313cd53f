use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use shared::{
    domain::{BookingRequest, FacilityId, RequestId, RequestStatus},
    protocol::{NewRequest, ScheduleDraft},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request {0:?} not found")]
    NotFound(RequestId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Submitted,
    Declined,
    Waitlisted,
}

#[derive(Debug, Clone)]
pub enum Mutation {
    Submit(NewRequest),
    Decline(RequestId),
    Waitlist(RequestId),
}

/// Outcome of a mutation. `request` is the affected record; for a decline it
/// is the removed record's only remaining copy.
#[derive(Debug, Clone)]
pub struct Applied {
    pub kind: MutationKind,
    pub request: BookingRequest,
}

/// Sole owner of the booking-request collection: an indexed map keyed by
/// request id. Views read projections; every write goes through [`apply`].
///
/// State is process-lifetime only. There is no persistence behind this store.
///
/// [`apply`]: RequestStore::apply
#[derive(Clone)]
pub struct RequestStore {
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    requests: BTreeMap<i64, BookingRequest>,
    next_request_id: i64,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            requests: BTreeMap::new(),
            next_request_id: 1,
        }
    }
}

impl RequestStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }

    pub async fn apply(&self, mutation: Mutation) -> Result<Applied, StoreError> {
        let mut inner = self.inner.write().await;
        match mutation {
            Mutation::Submit(new_request) => {
                let id = inner.next_request_id;
                inner.next_request_id += 1;
                let request = BookingRequest {
                    id: RequestId(id),
                    facility_id: new_request.facility_id,
                    client_id: new_request.client_id,
                    client_name: new_request.client_name,
                    client_contact: new_request.client_contact,
                    pet_id: new_request.pet_id,
                    pet_name: new_request.pet_name,
                    services: new_request.services,
                    created_at: Utc::now(),
                    appointment_at: new_request.appointment_at,
                    notes: new_request.notes,
                    status: RequestStatus::Pending,
                };
                inner.requests.insert(id, request.clone());
                Ok(Applied {
                    kind: MutationKind::Submitted,
                    request,
                })
            }
            Mutation::Decline(request_id) => {
                let removed = inner
                    .requests
                    .remove(&request_id.0)
                    .ok_or(StoreError::NotFound(request_id))?;
                Ok(Applied {
                    kind: MutationKind::Declined,
                    request: removed,
                })
            }
            Mutation::Waitlist(request_id) => {
                let request = inner
                    .requests
                    .get_mut(&request_id.0)
                    .ok_or(StoreError::NotFound(request_id))?;
                request.status = RequestStatus::Waitlisted;
                Ok(Applied {
                    kind: MutationKind::Waitlisted,
                    request: request.clone(),
                })
            }
        }
    }

    pub async fn get(&self, request_id: RequestId) -> Option<BookingRequest> {
        self.inner.read().await.requests.get(&request_id.0).cloned()
    }

    pub async fn list_for_facility(&self, facility_id: FacilityId) -> Vec<BookingRequest> {
        self.inner
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.facility_id == facility_id)
            .cloned()
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<BookingRequest> {
        self.inner.read().await.requests.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.requests.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.requests.is_empty()
    }
}

impl Default for RequestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-slot holding area for the schedule handoff payload. Staging a new
/// draft displaces any unconsumed one and hands it back to the caller, so a
/// replacement is observable rather than silent. `take` is the consuming read
/// used by the booking-creation screen.
#[derive(Clone)]
pub struct DraftSlot {
    inner: Arc<Mutex<Option<ScheduleDraft>>>,
}

impl DraftSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn stage(&self, draft: ScheduleDraft) -> Option<ScheduleDraft> {
        self.inner.lock().await.replace(draft)
    }

    pub async fn take(&self) -> Option<ScheduleDraft> {
        self.inner.lock().await.take()
    }

    pub async fn peek(&self) -> Option<ScheduleDraft> {
        self.inner.lock().await.clone()
    }
}

impl Default for DraftSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
