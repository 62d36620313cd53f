use std::sync::Arc;

use chrono::{TimeZone, Utc};
use notify_integration::LogOnlyDispatcher;
use shared::{
    domain::{ClientId, FacilityId, NotifyMode, PetId, RequestStatus, ServiceKind, TriageAction},
    protocol::NewRequest,
};
use storage::{DraftSlot, RequestStore};
use triage_api::{
    flow::TriageFlow, list_pending, list_waitlist, stage_schedule_draft, submit_request,
    take_schedule_draft, ApiContext,
};

#[tokio::test]
async fn triage_lifecycle_acceptance() {
    let ctx = ApiContext {
        store: RequestStore::new(),
        drafts: DraftSlot::new(),
        notifier: Arc::new(LogOnlyDispatcher),
    };

    let submission = |client_name: &str, pet_name: &str, day: u32| NewRequest {
        facility_id: FacilityId(11),
        client_id: ClientId(100),
        client_name: client_name.to_string(),
        client_contact: format!("{client_name}@example.com"),
        pet_id: PetId(200),
        pet_name: pet_name.to_string(),
        services: vec![ServiceKind::Boarding, ServiceKind::Daycare],
        appointment_at: Utc
            .with_ymd_and_hms(2026, 9, day, 10, 0, 0)
            .single()
            .expect("timestamp"),
        notes: Some("gate code 4411".to_string()),
    };

    let first = submit_request(&ctx, submission("Avery", "Milo", 1))
        .await
        .expect("first submission");
    let second = submit_request(&ctx, submission("Blair", "Nori", 2))
        .await
        .expect("second submission");

    let pending = list_pending(&ctx, FacilityId(11), &Default::default()).await;
    assert_eq!(pending.len(), 2);

    // Decline the first request, confirm, notify by email.
    let mut flow = TriageFlow::default();
    flow.begin(TriageAction::Decline, first.id).expect("begin");
    flow.confirm(&ctx).await.expect("confirm");
    let receipt = flow.finish(&ctx, NotifyMode::Email).await.expect("finish");

    let message = receipt.message.to_lowercase();
    assert!(message.contains("declined"));
    assert!(message.contains("email"));
    assert!(ctx.store.get(first.id).await.is_none());
    let remaining = ctx.store.snapshot().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);

    // Waitlist the second request with no notification.
    flow.begin(TriageAction::Waitlist, second.id).expect("begin");
    flow.confirm(&ctx).await.expect("confirm");
    let receipt = flow.finish(&ctx, NotifyMode::None).await.expect("finish");

    let message = receipt.message.to_lowercase();
    assert!(message.contains("waitlist"));
    assert!(message.contains("no message sent"));
    let stored = ctx.store.get(second.id).await.expect("still present");
    assert_eq!(stored.status, RequestStatus::Waitlisted);
    assert!(list_pending(&ctx, FacilityId(11), &Default::default())
        .await
        .is_empty());
    assert_eq!(list_waitlist(&ctx, FacilityId(11), &Default::default()).await.len(), 1);

    // Hand the waitlisted request off to the booking-creation screen.
    let staged = stage_schedule_draft(&ctx, second.id).await.expect("stage");
    assert!(!staged.replaced);
    assert_eq!(staged.draft.request_id, second.id);
    assert_eq!(staged.draft.service, ServiceKind::Boarding);
    assert_eq!(staged.draft.appointment_at, stored.appointment_at);

    // A second handoff before the first is consumed displaces it.
    let third = submit_request(&ctx, submission("Casey", "Pip", 3))
        .await
        .expect("third submission");
    let staged = stage_schedule_draft(&ctx, third.id).await.expect("stage");
    assert!(staged.replaced);

    let draft = take_schedule_draft(&ctx).await.expect("draft present");
    assert_eq!(draft.request_id, third.id);
    assert!(take_schedule_draft(&ctx).await.is_none());

    // The handed-off record itself is still in the store.
    assert!(ctx.store.get(third.id).await.is_some());
}
