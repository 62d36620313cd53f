use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use notify_integration::LogOnlyDispatcher;
use serde::Deserialize;
use shared::{
    domain::{BookingRequest, FacilityId, NotifyMode, OperatorId, RequestId, TriageAction},
    error::{ApiError, ErrorCode},
    protocol::{
        FlowStage, NewRequest, ScheduleDraft, ServerEvent, StagedDraft, TriageQuery, TriageReceipt,
    },
};
use storage::{DraftSlot, RequestStore};
use tokio::sync::{broadcast, Mutex};
use tracing::info;
use triage_api::{
    flow::TriageFlow, get_request, list_pending, list_waitlist, stage_schedule_draft,
    submit_request, take_schedule_draft, ApiContext,
};

mod config;

use config::load_settings;

struct AppState {
    api: ApiContext,
    events: broadcast::Sender<ServerEvent>,
    flows: Mutex<HashMap<OperatorId, TriageFlow>>,
}

#[derive(Debug, Deserialize)]
struct BeginTriageRequest {
    operator_id: i64,
    action: TriageAction,
    request_id: i64,
}

#[derive(Debug, Deserialize)]
struct OperatorRequest {
    operator_id: i64,
}

#[derive(Debug, Deserialize)]
struct FinishTriageRequest {
    operator_id: i64,
    #[serde(default)]
    notify: NotifyMode,
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    operator_id: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let api = ApiContext {
        store: RequestStore::new(),
        drafts: DraftSlot::new(),
        notifier: Arc::new(LogOnlyDispatcher),
    };
    let (events, _) = broadcast::channel(settings.events_buffer);

    let state = AppState {
        api,
        events,
        flows: Mutex::new(HashMap::new()),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "triage server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/requests", post(http_submit_request))
        .route("/requests/:request_id", get(http_get_request))
        .route(
            "/facilities/:facility_id/requests/pending",
            get(http_list_pending),
        )
        .route(
            "/facilities/:facility_id/requests/waitlist",
            get(http_list_waitlist),
        )
        .route("/triage/begin", post(http_begin_triage))
        .route("/triage/confirm", post(http_confirm_triage))
        .route("/triage/cancel", post(http_cancel_triage))
        .route("/triage/finish", post(http_finish_triage))
        .route("/requests/:request_id/schedule", post(http_stage_schedule))
        .route("/schedule/draft", get(http_take_draft))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn error_response(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Transport => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error))
}

async fn http_submit_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewRequest>,
) -> Result<Json<BookingRequest>, (StatusCode, Json<ApiError>)> {
    let request = submit_request(&state.api, req).await.map_err(error_response)?;
    let _ = state.events.send(ServerEvent::RequestSubmitted {
        request: request.clone(),
    });
    Ok(Json(request))
}

async fn http_get_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<i64>,
) -> Result<Json<BookingRequest>, (StatusCode, Json<ApiError>)> {
    let request = get_request(&state.api, RequestId(request_id))
        .await
        .map_err(error_response)?;
    Ok(Json(request))
}

async fn http_list_pending(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
    Query(query): Query<TriageQuery>,
) -> Json<Vec<BookingRequest>> {
    Json(list_pending(&state.api, FacilityId(facility_id), &query).await)
}

async fn http_list_waitlist(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
    Query(query): Query<TriageQuery>,
) -> Json<Vec<BookingRequest>> {
    Json(list_waitlist(&state.api, FacilityId(facility_id), &query).await)
}

async fn http_begin_triage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BeginTriageRequest>,
) -> Result<Json<FlowStage>, (StatusCode, Json<ApiError>)> {
    let mut flows = state.flows.lock().await;
    let flow = flows.entry(OperatorId(req.operator_id)).or_default();
    let stage = flow
        .begin(req.action, RequestId(req.request_id))
        .map_err(error_response)?;
    Ok(Json(stage))
}

async fn http_confirm_triage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OperatorRequest>,
) -> Result<Json<FlowStage>, (StatusCode, Json<ApiError>)> {
    let mut flows = state.flows.lock().await;
    let flow = flows.entry(OperatorId(req.operator_id)).or_default();
    let (stage, event) = flow.confirm(&state.api).await.map_err(error_response)?;
    let _ = state.events.send(event);
    Ok(Json(stage))
}

async fn http_cancel_triage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OperatorRequest>,
) -> Result<Json<FlowStage>, (StatusCode, Json<ApiError>)> {
    let mut flows = state.flows.lock().await;
    let flow = flows.entry(OperatorId(req.operator_id)).or_default();
    let stage = flow.cancel().map_err(error_response)?;
    Ok(Json(stage))
}

async fn http_finish_triage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FinishTriageRequest>,
) -> Result<Json<TriageReceipt>, (StatusCode, Json<ApiError>)> {
    let mut flows = state.flows.lock().await;
    let flow = flows.entry(OperatorId(req.operator_id)).or_default();
    let receipt = flow
        .finish(&state.api, req.notify)
        .await
        .map_err(error_response)?;
    Ok(Json(receipt))
}

async fn http_stage_schedule(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<i64>,
) -> Result<Json<StagedDraft>, (StatusCode, Json<ApiError>)> {
    let staged = stage_schedule_draft(&state.api, RequestId(request_id))
        .await
        .map_err(error_response)?;
    let _ = state.events.send(ServerEvent::DraftStaged {
        draft: staged.draft.clone(),
        replaced: staged.replaced,
    });
    Ok(Json(staged))
}

async fn http_take_draft(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScheduleDraft>, (StatusCode, Json<ApiError>)> {
    take_schedule_draft(&state.api)
        .await
        .map(Json)
        .ok_or_else(|| {
            error_response(ApiError::new(ErrorCode::NotFound, "no schedule draft staged"))
        })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(q): Query<WsQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket, OperatorId(q.operator_id)))
}

async fn ws_connection(
    state: Arc<AppState>,
    socket: axum::extract::ws::WebSocket,
    _operator_id: OperatorId,
) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}
