use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use growth_planner::{
    generate_plan, project, ContentGenerator, ExecutionState, PlanError, PlanInput, PlanSource,
    PlanStore, PlannerConfig, StrategyPlan,
};
use jiff::Timestamp;
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::api::{ApiPlanRequest, ApiPlanResponse, ExecutionQuery};
use crate::llm::LlmClient;

const DEFAULT_USER: &str = "local";
const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
const CHANNEL_TTL: Duration = Duration::from_secs(10);
/// Subscribers may connect before the plan request arrives.
const STREAM_CHANNEL_TTL: Duration = Duration::from_secs(120);

#[derive(Clone)]
struct AppState {
    config: Arc<PlannerConfig>,
    llm_client: Option<LlmClient>,
    store: Arc<PlanStore>,
    channels: Channels,
}

#[derive(Clone, Serialize)]
struct StreamEvent {
    event: String,
    message: String,
    timestamp_ms: i64,
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    request_id: String,
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub async fn serve(args: crate::ServeArgs, config: PlannerConfig) -> Result<(), String> {
    let store = PlanStore::load(config.store.path.clone(), config.store.max_plans_per_user)
        .await
        .map_err(|err| err.to_string())?;
    let llm_client = match LlmClient::from_env(&config.llm, None) {
        Ok(Some(client)) => Some(client),
        Ok(None) => {
            warn!("OPENAI_API_KEY is not set; plans will use the template fallback");
            None
        }
        Err(err) => {
            warn!(error = %err, "generation client unavailable; plans will use the template fallback");
            None
        }
    };

    let state = AppState {
        config: Arc::new(config),
        llm_client,
        store: Arc::new(store),
        channels: Arc::new(Mutex::new(HashMap::new())),
    };

    let web_root = args.web_root;
    let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
    let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/plans", post(create_plan_handler))
        .route("/api/plans/stream", get(stream_handler))
        .route("/api/users/:user_id/plans", get(list_plans_handler))
        .route(
            "/api/users/:user_id/plans/:plan_id",
            get(get_plan_handler).delete(delete_plan_handler),
        )
        .route(
            "/api/users/:user_id/plans/:plan_id/execution",
            get(execution_handler),
        )
        .nest_service("/", static_service)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    info!(%addr, "listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        format!("failed to bind server: {}", err)
    })?, app)
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn create_plan_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiPlanRequest>,
) -> Result<Json<ApiPlanResponse>, (StatusCode, String)> {
    let now = Timestamp::now();
    let request_id = request
        .request_id
        .clone()
        .unwrap_or_else(generate_request_id);
    let user_id = request
        .user_id
        .clone()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    let today = now
        .in_tz(DEFAULT_TIMEZONE)
        .map(|zoned| zoned.date())
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    let input = request
        .to_input(today)
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;

    let channel = get_or_create_channel(&state, &request_id).await;
    let result = run_plan_request(&state, &channel, &request, &input, &user_id, now).await;
    match &result {
        Ok(_) => send_event(&channel, "done", "Plan ready"),
        Err((_, message)) => send_event(&channel, "error", message),
    }
    schedule_cleanup(state.channels.clone(), request_id.clone(), CHANNEL_TTL);

    let (plan, warnings) = result?;
    Ok(Json(ApiPlanResponse {
        request_id,
        user_id,
        plan,
        warnings,
    }))
}

async fn run_plan_request(
    state: &AppState,
    channel: &broadcast::Sender<StreamEvent>,
    request: &ApiPlanRequest,
    input: &PlanInput,
    user_id: &str,
    now: Timestamp,
) -> Result<(StrategyPlan, Vec<String>), (StatusCode, String)> {
    send_event(channel, "start", "Running growth simulation");

    let mut warnings = Vec::new();
    let use_ai = request.use_ai.unwrap_or(true);
    let generator: Option<&dyn ContentGenerator> = match (&state.llm_client, use_ai) {
        (Some(client), true) => {
            send_event(channel, "calling", "Requesting weekly content plan");
            Some(client as &dyn ContentGenerator)
        }
        (None, true) => {
            warnings.push("AI generation not configured: set OPENAI_API_KEY".to_string());
            None
        }
        (_, false) => None,
    };

    let outcome = generate_plan(
        input,
        request.last_month.as_ref(),
        generator,
        &state.config,
        now,
    )
    .await
    .map_err(plan_error_response)?;
    warnings.extend(outcome.warnings);

    if generator.is_some() {
        match outcome.plan.source {
            PlanSource::Generated => send_event(channel, "received", "Generated plan received"),
            PlanSource::Fallback => {
                send_event(channel, "fallback", "Generation failed, using template plan")
            }
        }
    }
    send_event(channel, "normalize", "Schedule normalized to cadence");

    let plan = state
        .store
        .save(user_id, outcome.plan)
        .await
        .map_err(plan_error_response)?;
    send_event(channel, "saved", "Plan saved");
    Ok((plan, warnings))
}

async fn list_plans_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<StrategyPlan>> {
    Json(state.store.list(&user_id).await)
}

async fn get_plan_handler(
    State(state): State<AppState>,
    Path((user_id, plan_id)): Path<(String, String)>,
) -> Result<Json<StrategyPlan>, (StatusCode, String)> {
    find_plan(&state, &user_id, &plan_id).await.map(Json)
}

async fn delete_plan_handler(
    State(state): State<AppState>,
    Path((user_id, plan_id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .store
        .delete(&user_id, &plan_id)
        .await
        .map_err(plan_error_response)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(plan_error_response(PlanError::PlanNotFound { user_id, plan_id }))
    }
}

async fn execution_handler(
    State(state): State<AppState>,
    Path((user_id, plan_id)): Path<(String, String)>,
    Query(query): Query<ExecutionQuery>,
) -> Result<Json<ExecutionState>, (StatusCode, String)> {
    let plan = find_plan(&state, &user_id, &plan_id).await?;
    let timezone = query.tz.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    project(&plan, Timestamp::now(), &timezone, &state.config.schedule)
        .map(Json)
        .map_err(plan_error_response)
}

async fn find_plan(
    state: &AppState,
    user_id: &str,
    plan_id: &str,
) -> Result<StrategyPlan, (StatusCode, String)> {
    state.store.get(user_id, plan_id).await.ok_or_else(|| {
        plan_error_response(PlanError::PlanNotFound {
            user_id: user_id.to_string(),
            plan_id: plan_id.to_string(),
        })
    })
}

fn plan_error_response(err: PlanError) -> (StatusCode, String) {
    let status = match &err {
        PlanError::InvalidInput { .. } | PlanError::TimeZone { .. } => StatusCode::BAD_REQUEST,
        PlanError::PlanNotFound { .. } => StatusCode::NOT_FOUND,
        _ => {
            warn!(error = %err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>, StatusCode>
{
    let (sender, created) = get_or_create_channel_flagged(&state, &query.request_id).await;
    if created {
        schedule_cleanup(state.channels.clone(), query.request_id.clone(), STREAM_CHANNEL_TTL);
    }
    let receiver = sender.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| {
        match event {
            Ok(event) => {
                let data = serde_json::to_string(&event).unwrap_or_default();
                Some(Ok(Event::default().data(data)))
            }
            Err(_) => None,
        }
    });

    send_event(&sender, "connected", "Streaming plan progress");
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8))))
}

async fn get_or_create_channel(
    state: &AppState,
    request_id: &str,
) -> broadcast::Sender<StreamEvent> {
    get_or_create_channel_flagged(state, request_id).await.0
}

/// Second value is true when this call created the channel.
async fn get_or_create_channel_flagged(
    state: &AppState,
    request_id: &str,
) -> (broadcast::Sender<StreamEvent>, bool) {
    let mut guard = state.channels.lock().await;
    if let Some(sender) = guard.get(request_id) {
        return (sender.clone(), false);
    }
    let (sender, _) = broadcast::channel(32);
    guard.insert(request_id.to_string(), sender.clone());
    (sender, true)
}

fn send_event(sender: &broadcast::Sender<StreamEvent>, event: &str, message: &str) {
    let _ = sender.send(StreamEvent {
        event: event.to_string(),
        message: message.to_string(),
        timestamp_ms: Timestamp::now().as_millisecond(),
    });
}

type Channels = Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>;

fn schedule_cleanup(channels: Channels, request_id: String, ttl: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        let mut guard = channels.lock().await;
        guard.remove(&request_id);
    });
}

fn generate_request_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{}-{}", Timestamp::now().as_millisecond(), counter)
}
