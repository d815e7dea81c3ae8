//! HTTP surface: thin axum handlers over the orchestrator and the
//! passthrough clients. Handlers decode a payload, call one operation, and
//! encode the result; no business logic lives here.

pub mod error;

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use pmf_core::models::{AnalysisRow, QuestionItem, QuestionStatus, Report, Session};

use crate::orchestrator::Orchestrator;
use crate::research::{product_research_query, ResearchClient, TaskKind};
use crate::speech::{AudioUpload, SpeechClient};
use error::ApiError;

#[derive(Clone)]
pub struct ApiContext {
    pub orchestrator: Arc<Orchestrator>,
    pub speech: SpeechClient,
    pub research: ResearchClient,
}

pub fn create_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health/yutori", get(yutori_health))
        .route("/start", post(start_session))
        .route("/questions", post(generate_questions))
        .route("/get-session", get(get_persistent_session))
        .route("/live/start", post(go_live))
        .route("/live/transcript", post(add_transcript))
        .route("/live/stop", post(stop_live))
        .route("/live/questions", get(get_live_questions))
        .route("/live/question/status", post(update_question_status))
        .route("/analysis", get(get_analysis))
        .route("/report", post(generate_report))
        .route("/session/{session_id}", get(get_session))
        .route("/sessions", get(list_sessions))
        .route("/transcribe", post(transcribe_openai))
        .route("/transcribe/deepgram", post(transcribe_deepgram))
        .route("/deepgram-key", get(get_deepgram_key))
        .route("/yutori/research/tasks", post(create_research_task))
        .route("/yutori/research/tasks/{task_id}", get(get_research_task))
        .route("/research", post(research_product))
        .route("/research/{task_id}", get(get_product_research))
        .route("/yutori/scouting/tasks", post(create_scouting_task))
        .route("/yutori/scouting/tasks/{task_id}", get(get_scouting_task))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(ctx)
}

// -- request/response payloads ---------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub product: String,
    #[serde(default = "default_start_count")]
    pub count: usize,
}

fn default_start_count() -> usize {
    3
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    pub product: String,
    #[serde(default = "default_questions_count")]
    pub count: usize,
}

fn default_questions_count() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRef {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub followups: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetQuestionsResponse {
    pub questions: Vec<QuestionItem>,
    pub current_question: Option<QuestionItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuestionStatusRequest {
    pub session_id: String,
    pub question_id: Uuid,
    pub status: QuestionStatus,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub rows: Vec<AnalysisRow>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: Report,
}

/// Accepts `query` or the legacy `task` field name.
#[derive(Debug, Deserialize)]
pub struct ResearchTaskRequest {
    pub query: Option<String>,
    pub task: Option<String>,
    pub start_url: Option<String>,
}

impl ResearchTaskRequest {
    fn normalized_query(self) -> Result<(String, Option<String>), ApiError> {
        let query = self
            .query
            .filter(|q| !q.is_empty())
            .or(self.task)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                ApiError::UnprocessableEntity("Missing required field: query".into())
            })?;
        Ok((query, self.start_url))
    }
}

#[derive(Debug, Serialize)]
pub struct UpstreamResponse {
    pub upstream: Value,
}

#[derive(Debug, Deserialize)]
pub struct ProductResearchRequest {
    pub product: String,
    pub focus: Option<String>,
    pub start_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeepgramKeyResponse {
    pub api_key: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub product: String,
    pub status: String,
    pub transcript_length: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub count: usize,
    pub sessions: Vec<SessionSummary>,
}

// -- handlers ---------------------------------------------------------------

async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "PMF Researcher API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn yutori_health(State(ctx): State<ApiContext>) -> Result<Json<Value>, ApiError> {
    Ok(Json(ctx.research.health().await?))
}

async fn start_session(
    State(ctx): State<ApiContext>,
    Json(req): Json<StartRequest>,
) -> Json<StartResponse> {
    let (session_id, questions) = ctx.orchestrator.start(&req.product, req.count).await;
    Json(StartResponse {
        session_id,
        questions,
    })
}

async fn generate_questions(
    State(ctx): State<ApiContext>,
    Json(req): Json<QuestionsRequest>,
) -> Json<QuestionsResponse> {
    let questions = ctx
        .orchestrator
        .generate_questions(&req.product, req.count)
        .await;
    Json(QuestionsResponse { questions })
}

async fn get_persistent_session(State(ctx): State<ApiContext>) -> Json<StartResponse> {
    let (session_id, questions) = ctx.orchestrator.get_or_create_session();
    Json(StartResponse {
        session_id,
        questions,
    })
}

async fn go_live(
    State(ctx): State<ApiContext>,
    Json(req): Json<SessionRef>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.orchestrator.go_live(&req.session_id)?;
    Ok(Json(StatusResponse { status: "live" }))
}

async fn add_transcript(
    State(ctx): State<ApiContext>,
    Json(req): Json<TranscriptRequest>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let followups = ctx
        .orchestrator
        .submit_transcript(&req.session_id, &req.text)
        .await?;
    Ok(Json(TranscriptResponse { followups }))
}

async fn stop_live(
    State(ctx): State<ApiContext>,
    Json(req): Json<SessionRef>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.orchestrator.stop(&req.session_id)?;
    Ok(Json(StatusResponse { status: "stopped" }))
}

async fn get_live_questions(
    State(ctx): State<ApiContext>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<GetQuestionsResponse>, ApiError> {
    let (questions, current_question) = ctx.orchestrator.live_questions(&query.session_id)?;
    Ok(Json(GetQuestionsResponse {
        questions,
        current_question,
    }))
}

async fn update_question_status(
    State(ctx): State<ApiContext>,
    Json(req): Json<UpdateQuestionStatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.orchestrator
        .update_question_status(&req.session_id, req.question_id, req.status)?;
    Ok(Json(StatusResponse { status: "updated" }))
}

async fn get_analysis(
    State(ctx): State<ApiContext>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let rows = ctx.orchestrator.analyze(&query.session_id).await?;
    Ok(Json(AnalysisResponse { rows }))
}

async fn generate_report(
    State(ctx): State<ApiContext>,
    Json(req): Json<SessionRef>,
) -> Result<Json<ReportResponse>, ApiError> {
    let report = ctx.orchestrator.report(&req.session_id).await?;
    Ok(Json(ReportResponse { report }))
}

async fn get_session(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(ctx.orchestrator.get_session(&session_id)?))
}

async fn list_sessions(State(ctx): State<ApiContext>) -> Json<SessionListResponse> {
    let sessions = ctx.orchestrator.list_sessions();
    let summaries = sessions
        .iter()
        .map(|s| SessionSummary {
            session_id: s.id.clone(),
            product: truncate_product(&s.product),
            status: s.status.as_str().to_string(),
            transcript_length: s.transcript.len(),
        })
        .collect::<Vec<_>>();
    Json(SessionListResponse {
        count: summaries.len(),
        sessions: summaries,
    })
}

fn truncate_product(product: &str) -> String {
    if product.chars().count() > 50 {
        let short: String = product.chars().take(50).collect();
        format!("{short}...")
    } else {
        product.to_string()
    }
}

// -- speech passthrough ------------------------------------------------------

async fn read_audio_upload(mut multipart: Multipart) -> Result<AudioUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("audio.wav").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_vec();
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Empty audio file".into()));
        }
        return Ok(AudioUpload {
            filename,
            content_type,
            bytes,
        });
    }
    Err(ApiError::BadRequest("Missing audio file".into()))
}

async fn transcribe_openai(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let upload = read_audio_upload(multipart).await?;
    Ok(Json(ctx.speech.transcribe_openai(upload).await?))
}

async fn transcribe_deepgram(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let upload = read_audio_upload(multipart).await?;
    Ok(Json(ctx.speech.transcribe_deepgram(upload).await?))
}

async fn get_deepgram_key(State(ctx): State<ApiContext>) -> Json<DeepgramKeyResponse> {
    match ctx.speech.deepgram_api_key() {
        Some(key) => Json(DeepgramKeyResponse {
            api_key: Some(key.to_string()),
            message: "Deepgram API key available".into(),
        }),
        None => Json(DeepgramKeyResponse {
            api_key: None,
            message: "DEEPGRAM_API_KEY not set. Get a free API key at https://deepgram.com \
(60 hours/month free)"
                .into(),
        }),
    }
}

// -- research/scouting passthrough -------------------------------------------

async fn create_research_task(
    State(ctx): State<ApiContext>,
    Json(req): Json<ResearchTaskRequest>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let (query, start_url) = req.normalized_query()?;
    let upstream = ctx
        .research
        .create_task(TaskKind::Research, query, start_url)
        .await?;
    Ok(Json(UpstreamResponse { upstream }))
}

async fn get_research_task(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let upstream = ctx.research.get_task(TaskKind::Research, &task_id).await?;
    Ok(Json(UpstreamResponse { upstream }))
}

async fn research_product(
    State(ctx): State<ApiContext>,
    Json(req): Json<ProductResearchRequest>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let query = product_research_query(&req.product, req.focus.as_deref());
    let upstream = ctx
        .research
        .create_task(TaskKind::Research, query, req.start_url)
        .await?;
    Ok(Json(UpstreamResponse { upstream }))
}

async fn get_product_research(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let upstream = ctx.research.get_task(TaskKind::Research, &task_id).await?;
    Ok(Json(UpstreamResponse { upstream }))
}

async fn create_scouting_task(
    State(ctx): State<ApiContext>,
    Json(req): Json<ResearchTaskRequest>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let (query, start_url) = req.normalized_query()?;
    let upstream = ctx
        .research
        .create_task(TaskKind::Scouting, query, start_url)
        .await?;
    Ok(Json(UpstreamResponse { upstream }))
}

async fn get_scouting_task(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
) -> Result<Json<UpstreamResponse>, ApiError> {
    let upstream = ctx.research.get_task(TaskKind::Scouting, &task_id).await?;
    Ok(Json(UpstreamResponse { upstream }))
}
