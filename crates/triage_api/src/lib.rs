use std::sync::Arc;

use notify_integration::NotificationDispatcher;
use shared::{
    domain::{BookingRequest, FacilityId, RequestId, RequestStatus},
    error::{ApiError, ErrorCode},
    protocol::{NewRequest, ScheduleDraft, SortDir, SortKey, StagedDraft, TriageQuery},
};
use storage::{DraftSlot, Mutation, RequestStore};
use tracing::warn;

pub mod flow;

#[derive(Clone)]
pub struct ApiContext {
    pub store: RequestStore,
    pub drafts: DraftSlot,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

pub async fn submit_request(
    ctx: &ApiContext,
    new_request: NewRequest,
) -> Result<BookingRequest, ApiError> {
    if new_request.client_name.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "client name cannot be empty",
        ));
    }
    if new_request.services.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "at least one service is required",
        ));
    }
    let applied = ctx
        .store
        .apply(Mutation::Submit(new_request))
        .await
        .map_err(|e| ApiError::new(ErrorCode::Internal, e.to_string()))?;
    Ok(applied.request)
}

pub async fn get_request(ctx: &ApiContext, request_id: RequestId) -> Result<BookingRequest, ApiError> {
    ctx.store
        .get(request_id)
        .await
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "request not found"))
}

pub async fn list_pending(
    ctx: &ApiContext,
    facility_id: FacilityId,
    query: &TriageQuery,
) -> Vec<BookingRequest> {
    triage_rows(ctx, facility_id, RequestStatus::Pending, query).await
}

pub async fn list_waitlist(
    ctx: &ApiContext,
    facility_id: FacilityId,
    query: &TriageQuery,
) -> Vec<BookingRequest> {
    triage_rows(ctx, facility_id, RequestStatus::Waitlisted, query).await
}

async fn triage_rows(
    ctx: &ApiContext,
    facility_id: FacilityId,
    status: RequestStatus,
    query: &TriageQuery,
) -> Vec<BookingRequest> {
    let mut rows: Vec<BookingRequest> = ctx
        .store
        .list_for_facility(facility_id)
        .await
        .into_iter()
        .filter(|request| request.status == status)
        .collect();

    if let Some(needle) = query.search.as_deref() {
        let needle = needle.to_lowercase();
        if !needle.is_empty() {
            rows.retain(|request| search_haystack(request).contains(&needle));
        }
    }

    sort_rows(&mut rows, query.sort, query.dir);
    rows
}

/// Lowercased concatenation of the searchable display fields. Notes are not
/// searched; contact is searchable but not sortable.
pub fn search_haystack(request: &BookingRequest) -> String {
    let services = request
        .services
        .iter()
        .map(|service| service.label())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{} {} {} {}",
        request.client_name, request.client_contact, request.pet_name, services
    )
    .to_lowercase()
}

fn sort_rows(rows: &mut [BookingRequest], key: SortKey, dir: SortDir) {
    rows.sort_by(|a, b| {
        let ordering = match key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::AppointmentAt => a.appointment_at.cmp(&b.appointment_at),
            SortKey::ClientName => a
                .client_name
                .to_lowercase()
                .cmp(&b.client_name.to_lowercase()),
            SortKey::PetName => a.pet_name.to_lowercase().cmp(&b.pet_name.to_lowercase()),
        };
        // Ties break by id so every sort is a total order and re-sorting
        // round-trips.
        let ordering = ordering.then_with(|| a.id.0.cmp(&b.id.0));
        match dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
}

/// Builds the handoff payload for the booking-creation screen and stages it.
/// The source record stays in the store; it leaves the triage working set
/// only once the target screen completes scheduling.
pub async fn stage_schedule_draft(
    ctx: &ApiContext,
    request_id: RequestId,
) -> Result<StagedDraft, ApiError> {
    let request = get_request(ctx, request_id).await?;
    let service = request.services.first().copied().ok_or_else(|| {
        ApiError::new(
            ErrorCode::Validation,
            "request has no services to schedule",
        )
    })?;

    let draft = ScheduleDraft {
        request_id: request.id,
        client_id: request.client_id,
        pet_id: request.pet_id,
        service,
        appointment_at: request.appointment_at,
    };
    let displaced = ctx.drafts.stage(draft.clone()).await;
    if let Some(displaced) = &displaced {
        warn!(
            request_id = displaced.request_id.0,
            "replacing unconsumed schedule draft"
        );
    }

    Ok(StagedDraft {
        draft,
        replaced: displaced.is_some(),
    })
}

pub async fn take_schedule_draft(ctx: &ApiContext) -> Option<ScheduleDraft> {
    ctx.drafts.take().await
}
