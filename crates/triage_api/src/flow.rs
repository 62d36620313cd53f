use notify_integration::{NotifyContext, NotifyTarget};
use shared::{
    domain::{BookingRequest, NotifyMode, RequestId, TriageAction},
    error::{ApiError, ErrorCode},
    protocol::{FlowStage, ServerEvent, TriageReceipt},
};
use storage::Mutation;

use crate::ApiContext;

/// Two-stage confirmation flow for a single operator.
///
/// `Notifying` holds the affected record itself: a decline removes it from
/// the store, so this snapshot is what the notification step works from.
#[derive(Debug, Clone, Default)]
pub enum TriageFlow {
    #[default]
    Idle,
    Confirming {
        action: TriageAction,
        request_id: RequestId,
    },
    Notifying {
        action: TriageAction,
        request: BookingRequest,
    },
}

impl TriageFlow {
    pub fn stage(&self) -> FlowStage {
        match self {
            TriageFlow::Idle => FlowStage::Idle,
            TriageFlow::Confirming { action, request_id } => FlowStage::Confirming {
                action: *action,
                request_id: *request_id,
            },
            TriageFlow::Notifying { action, request } => FlowStage::Notifying {
                action: *action,
                request_id: request.id,
            },
        }
    }

    pub fn begin(
        &mut self,
        action: TriageAction,
        request_id: RequestId,
    ) -> Result<FlowStage, ApiError> {
        match self {
            TriageFlow::Idle => {
                *self = TriageFlow::Confirming { action, request_id };
                Ok(self.stage())
            }
            _ => Err(ApiError::new(
                ErrorCode::Conflict,
                "a triage action is already in progress",
            )),
        }
    }

    /// Applies the confirmed transition to the store and advances to the
    /// notification step. Also yields the event other screens observe.
    pub async fn confirm(
        &mut self,
        ctx: &ApiContext,
    ) -> Result<(FlowStage, ServerEvent), ApiError> {
        let (action, request_id) = match self {
            TriageFlow::Confirming { action, request_id } => (*action, *request_id),
            _ => {
                return Err(ApiError::new(
                    ErrorCode::Conflict,
                    "no triage action awaiting confirmation",
                ))
            }
        };

        let mutation = match action {
            TriageAction::Decline => Mutation::Decline(request_id),
            TriageAction::Waitlist => Mutation::Waitlist(request_id),
        };
        let applied = match ctx.store.apply(mutation).await {
            Ok(applied) => applied,
            Err(_) => {
                // The record vanished between begin and confirm; nothing left
                // to confirm against.
                *self = TriageFlow::Idle;
                return Err(ApiError::new(
                    ErrorCode::Conflict,
                    "request already actioned",
                ));
            }
        };

        let event = match action {
            TriageAction::Decline => ServerEvent::RequestDeclined {
                request_id: applied.request.id,
                facility_id: applied.request.facility_id,
            },
            TriageAction::Waitlist => ServerEvent::RequestWaitlisted {
                request: applied.request.clone(),
            },
        };
        *self = TriageFlow::Notifying {
            action,
            request: applied.request,
        };
        Ok((self.stage(), event))
    }

    /// Aborts before the store is touched. Invalid once the transition has
    /// been applied.
    pub fn cancel(&mut self) -> Result<FlowStage, ApiError> {
        match self {
            TriageFlow::Confirming { .. } => {
                *self = TriageFlow::Idle;
                Ok(self.stage())
            }
            _ => Err(ApiError::new(ErrorCode::Conflict, "nothing to cancel")),
        }
    }

    /// Dispatches the chosen notification (if any) and returns to idle with
    /// the operator-facing receipt. On a dispatch failure the flow stays in
    /// `Notifying` so the operator can retry with another mode.
    pub async fn finish(
        &mut self,
        ctx: &ApiContext,
        mode: NotifyMode,
    ) -> Result<TriageReceipt, ApiError> {
        let (action, request) = match self {
            TriageFlow::Notifying { action, request } => (*action, request.clone()),
            _ => {
                return Err(ApiError::new(
                    ErrorCode::Conflict,
                    "no triage outcome awaiting notification",
                ))
            }
        };

        if mode != NotifyMode::None {
            let target = NotifyTarget {
                client_name: request.client_name.clone(),
                contact: request.client_contact.clone(),
            };
            let context = NotifyContext {
                request_id: request.id,
                facility_id: request.facility_id,
                action,
                pet_name: request.pet_name.clone(),
                appointment_at: request.appointment_at,
            };
            ctx.notifier
                .dispatch(&target, mode, &context)
                .await
                .map_err(|error| ApiError::new(ErrorCode::Transport, error.to_string()))?;
        }

        *self = TriageFlow::Idle;
        Ok(TriageReceipt {
            action,
            request_id: request.id,
            notify_mode: mode,
            message: receipt_message(action, mode),
        })
    }
}

pub fn receipt_message(action: TriageAction, mode: NotifyMode) -> String {
    let outcome = match action {
        TriageAction::Decline => "Request declined.",
        TriageAction::Waitlist => "Request waitlisted.",
    };
    let notice = match mode {
        NotifyMode::None => "No message sent.",
        NotifyMode::Text => "Text notification sent.",
        NotifyMode::Email => "Email notification sent.",
        NotifyMode::Both => "Text and email notifications sent.",
    };
    format!("{outcome} {notice}")
}
