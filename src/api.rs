//! REST API Server for the Beacon realty agent
//!
//! Chat, lead capture, recommendations and the property catalog over HTTP.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{PropertyCatalog, PropertyQuery, SIMILAR_LIMIT};
use crate::dispatcher::{DispatchOutcome, ModelDispatcher};
use crate::error::BeaconError;
use crate::extractor::PreferenceExtractor;
use crate::leads::LeadStore;
use crate::llm::Usage;
use crate::mcp::{
    parse_property_query, NaturalLanguageQueryResponse, PropertyDetailResponse, SearchResponse,
    UNFILTERED_SAMPLE_SIZE,
};
use crate::models::{CollectedInfo, ConversationState, InvestmentStrategy, LeadProfile};
use crate::session::{load_or_new, resolve_session_id, SessionStore};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_info: Option<CollectedInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitProfileRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub profile: CollectedInfo,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub investment_strategy: Option<InvestmentStrategy>,
    #[serde(default)]
    pub boroughs: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<String>,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub message: String,
    pub over_budget: bool,
    pub model: Option<String>,
    pub extracted: CollectedInfo,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub session_id: Uuid,
    pub user_id: i64,
    pub profile_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub model: String,
    pub reply: String,
    pub usage: Option<Usage>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Failed request that still carries a payload for the client.
    pub fn failure<T: Serialize>(message: String, data: T) -> Self {
        Self {
            data: serde_json::to_value(data).ok(),
            ..Self::error(message)
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn status_for(err: &BeaconError) -> StatusCode {
    match err {
        BeaconError::ValidationError(_) => StatusCode::BAD_REQUEST,
        BeaconError::NotFound(_) => StatusCode::NOT_FOUND,
        BeaconError::LlmError(_) | BeaconError::HttpError(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(err: BeaconError) -> ApiResult {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        info!("Request rejected: {}", err);
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

fn bad_body(rejection: JsonRejection) -> ApiResult {
    fail(BeaconError::ValidationError(rejection.body_text()))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<PropertyCatalog>,
    pub sessions: Arc<dyn SessionStore>,
    pub dispatcher: Arc<ModelDispatcher>,
    pub leads: Arc<dyn LeadStore>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let message = req.message.trim();
    if message.is_empty() {
        return fail(BeaconError::ValidationError("message is required".into()));
    }

    let session_id = resolve_session_id(req.session_id.as_deref());
    let mut conversation = match load_or_new(state.sessions.as_ref(), session_id).await {
        Ok(conversation) => conversation,
        Err(e) => return fail(e),
    };
    info!("Chat message for session {}", session_id);

    if let Some(user_info) = &req.user_info {
        conversation.collected_info.merge(user_info);
    }
    let extracted = PreferenceExtractor::apply(&mut conversation.collected_info, message);

    let outcome = state.dispatcher.dispatch(&mut conversation, message).await;

    if let Err(e) = state.sessions.save(session_id, &conversation).await {
        return fail(e);
    }

    let response = ChatResponse {
        session_id,
        message: outcome.message().to_string(),
        over_budget: outcome.is_over_budget(),
        model: match &outcome {
            DispatchOutcome::Replied { model, .. } => Some(model.clone()),
            _ => None,
        },
        extracted,
        state: conversation,
    };

    if outcome.is_unavailable() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::failure(
                "Language model unavailable".to_string(),
                response,
            )),
        );
    }
    ok(response)
}

/// =============================
/// Lead Endpoints
/// =============================

async fn submit_profile(
    State(state): State<ApiState>,
    payload: Result<Json<SubmitProfileRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let session_id = resolve_session_id(req.session_id.as_deref());
    let mut conversation = match load_or_new(state.sessions.as_ref(), session_id).await {
        Ok(conversation) => conversation,
        Err(e) => return fail(e),
    };
    conversation.collected_info.merge(&req.profile);

    let Some(lead) = LeadProfile::from_collected(&conversation.collected_info) else {
        return fail(BeaconError::ValidationError(
            "email is required to submit a profile".into(),
        ));
    };

    let receipt = match state.leads.save_lead(&lead).await {
        Ok(receipt) => receipt,
        Err(e) => return fail(e),
    };
    info!(
        "Saved lead user_id={} profile_id={} via {}",
        receipt.user_id,
        receipt.profile_id,
        state.leads.backend_name()
    );

    conversation.last_lead = Some(receipt);
    conversation.touch();
    if let Err(e) = state.sessions.save(session_id, &conversation).await {
        warn!("Lead saved but session {} was not updated: {}", session_id, e);
    }

    ok(ProfileResponse {
        session_id,
        user_id: receipt.user_id,
        profile_id: receipt.profile_id,
    })
}

async fn recommendation(
    State(state): State<ApiState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let collected = match req.session_id.as_deref() {
        Some(raw) => match state.sessions.load(resolve_session_id(Some(raw))).await {
            Ok(found) => found.map(|c| c.collected_info).unwrap_or_default(),
            Err(e) => return fail(e),
        },
        None => CollectedInfo::default(),
    };

    let Some(strategy) = req.investment_strategy.or(collected.investment_strategy) else {
        return fail(BeaconError::ValidationError(
            "investment_strategy is required".into(),
        ));
    };
    let boroughs = if req.boroughs.is_empty() {
        &collected.boroughs
    } else {
        &req.boroughs
    };
    let property_types = if req.property_types.is_empty() {
        &collected.property_types
    } else {
        &req.property_types
    };

    info!(
        "Recommendation for strategy={} boroughs={:?} property_types={:?}",
        strategy, boroughs, property_types
    );

    match state.catalog.recommend(strategy, boroughs, property_types) {
        Some(property) => ok(property),
        None => fail(BeaconError::NotFound("No matching properties found".into())),
    }
}

/// =============================
/// Property Endpoints
/// =============================

async fn list_properties(
    State(state): State<ApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult {
    let criteria = match PropertyQuery::from_params(&params) {
        Ok(criteria) => criteria,
        Err(e) => return fail(e),
    };
    let properties = state.catalog.query(&criteria);
    info!("Property search returned {} properties", properties.len());

    ok(SearchResponse::new(&criteria, &properties))
}

async fn get_property(State(state): State<ApiState>, Path(property_id): Path<String>) -> ApiResult {
    let found = property_id
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|id| state.catalog.get(id));

    match found {
        Some(property) => {
            let similar = state.catalog.similar(property.property_id, SIMILAR_LIMIT);
            ok(PropertyDetailResponse::new(property, &similar))
        }
        None => fail(BeaconError::NotFound("Property not found".into())),
    }
}

async fn property_query(
    State(state): State<ApiState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let Some(query) = body.get("query").and_then(|q| q.as_str()) else {
        return fail(BeaconError::ValidationError("Missing query parameter".into()));
    };

    let extracted = parse_property_query(query);
    let mut criteria = extracted.to_query();
    if criteria.has_no_filters() {
        criteria.limit = UNFILTERED_SAMPLE_SIZE;
    }
    let properties = state.catalog.query(&criteria);
    info!("Property query {:?} matched {} properties", query, properties.len());

    ok(NaturalLanguageQueryResponse::new(
        query,
        extracted,
        &properties,
        chrono::Utc::now(),
    ))
}

/// =============================
/// Session & Diagnostics
/// =============================

async fn get_session(State(state): State<ApiState>, Path(raw_id): Path<String>) -> ApiResult {
    let session_id = resolve_session_id(Some(&raw_id));
    match state.sessions.load(session_id).await {
        Ok(Some(conversation)) => ok(SessionResponse {
            session_id,
            state: conversation,
        }),
        Ok(None) => fail(BeaconError::NotFound("Session not found".into())),
        Err(e) => fail(e),
    }
}

async fn llm_ping(State(state): State<ApiState>) -> ApiResult {
    match state.dispatcher.ping().await {
        Ok(completion) => ok(PingResponse {
            model: state.dispatcher.primary_model().to_string(),
            reply: completion.text,
            usage: completion.usage,
        }),
        Err(e) => fail(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/submit_profile", post(submit_profile))
        .route("/api/recommendation", post(recommendation))
        .route("/api/properties", get(list_properties))
        .route("/api/properties/:property_id", get(get_property))
        .route("/api/mcp/property-query", post(property_query))
        .route("/api/sessions/:session_id", get(get_session))
        .route("/api/llm/ping", get(llm_ping))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
