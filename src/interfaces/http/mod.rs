use crate::application::use_cases::audit_package::{
    build_audit_package, AuditPackage, AuditPackageInput, UrsSource,
};
use crate::application::use_cases::rtm_generator::{generate_rtm_docx, generate_rtm_xlsx};
use crate::application::use_cases::template_populator::populate_template;
use crate::application::use_cases::text_extraction::{extension_of, extract};
use crate::application::use_cases::upload_sessions::{NewUpload, SessionSummary};
use crate::application::use_cases::validation_docs::{
    generate_validation_plan, generate_validation_summary, ExecutionResults,
};
use crate::domain::baseline::{Baseline, ChangeAnalysis};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::domain::quality::QualityReport;
use crate::domain::test_step::{validate_steps, TestStep};
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const ZIP_CONTENT_TYPE: &str = "application/zip";
const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

/// An uploaded file carried inside a JSON body.
#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub file_name: String,
    pub content_base64: String,
}

impl FilePayload {
    fn decode(&self, max_bytes: usize) -> Result<Vec<u8>> {
        let encoded = self.content_base64.trim();
        if encoded.len() / 4 * 3 > max_bytes + 3 {
            return Err(too_large(&self.file_name, max_bytes));
        }
        let bytes = BASE64.decode(encoded).map_err(|e| {
            AppError::ValidationError(format!("'{}' is not valid base64: {}", self.file_name, e))
        })?;
        if bytes.len() > max_bytes {
            return Err(too_large(&self.file_name, max_bytes));
        }
        if bytes.is_empty() {
            return Err(AppError::ValidationError(format!("'{}' is empty", self.file_name)));
        }
        Ok(bytes)
    }

    fn extension(&self) -> String {
        extension_of(&self.file_name).unwrap_or_default()
    }
}

fn too_large(file_name: &str, max_bytes: usize) -> AppError {
    AppError::ValidationError(format!(
        "'{}' exceeds the {} MiB upload limit",
        file_name,
        max_bytes / (1024 * 1024)
    ))
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub urs: FilePayload,
    #[serde(default)]
    pub template: Option<FilePayload>,
    #[serde(default)]
    pub config: Option<LLMConfig>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub urs: FilePayload,
    pub template: FilePayload,
    #[serde(default)]
    pub config: Option<LLMConfig>,
}

#[derive(Deserialize)]
pub struct UpdateStepsRequest {
    pub test_steps: Vec<TestStep>,
}

#[derive(Deserialize, Default)]
pub struct RenderRequest {
    #[serde(default)]
    pub template: Option<FilePayload>,
}

#[derive(Deserialize, Default)]
pub struct AuditRequest {
    #[serde(default)]
    pub config: Option<LLMConfig>,
    #[serde(default)]
    pub include_quality_check: bool,
    /// Compare against this project's latest baseline when set.
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub execution_results: Option<ExecutionResults>,
}

#[derive(Deserialize)]
pub struct QualityRequest {
    #[serde(default)]
    pub urs: Option<FilePayload>,
    #[serde(default)]
    pub urs_text: Option<String>,
    #[serde(default)]
    pub config: Option<LLMConfig>,
}

#[derive(Deserialize)]
pub struct BaselineRequest {
    pub project_name: String,
    pub urs_text: String,
    pub test_steps: Vec<TestStep>,
}

#[derive(Deserialize)]
pub struct StepsRequest {
    pub test_steps: Vec<TestStep>,
}

#[derive(Deserialize)]
pub struct SummaryRequest {
    pub test_steps: Vec<TestStep>,
    #[serde(default)]
    pub execution_results: Option<ExecutionResults>,
}

#[derive(Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_reply: Option<String>,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) | AppError::ExtractionError(_) | AppError::TemplateError(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::LLMError(_) | AppError::ParseError { .. } | AppError::MissingField { .. } => {
            StatusCode::BAD_GATEWAY
        }
        AppError::Internal(_) | AppError::SecurityError(_) | AppError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failure(logs: &Mutex<Vec<LogEntry>>, source: &str, context: &str, err: AppError) -> HttpResponse {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(source, error = %err, "{}", context);
        add_log(logs, "ERROR", source, &format!("{}: {}", context, err));
    } else {
        warn!(source, error = %err, "{}", context);
        add_log(logs, "WARN", source, &format!("{}: {}", context, err));
    }
    HttpResponse::build(status).json(ErrorBody {
        error: err.to_string(),
        raw_reply: err.raw_reply().map(str::to_string),
    })
}

fn attachment(bytes: Vec<u8>, file_name: &str, content_type: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(bytes)
}

fn file_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

async fn extract_upload<T>(bytes: T, extension: String) -> Result<String>
where
    T: AsRef<[u8]> + Send + 'static,
{
    web::block(move || extract(bytes.as_ref(), &extension))
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
}

async fn populate_blocking<T>(template: T, steps: Vec<TestStep>) -> Result<Vec<u8>>
where
    T: AsRef<[u8]> + Send + 'static,
{
    web::block(move || populate_template(template.as_ref(), &steps))
        .await
        .map_err(|e| AppError::Internal(format!("Template task failed: {}", e)))?
}

fn decode_template(template: &FilePayload, max_bytes: usize) -> Result<Vec<u8>> {
    if template.extension() != "docx" {
        return Err(AppError::TemplateError(format!(
            "template '{}' must be a .docx file",
            template.file_name
        )));
    }
    template.decode(max_bytes)
}

async fn open_preview(state: &AppState, req: PreviewRequest) -> Result<SessionSummary> {
    let max_bytes = state.config.limits.max_upload_bytes;
    let urs_bytes: Arc<[u8]> = req.urs.decode(max_bytes)?.into();
    let template_bytes: Option<Arc<[u8]>> = req
        .template
        .as_ref()
        .map(|template| decode_template(template, max_bytes).map(Arc::from))
        .transpose()?;

    let extension = req.urs.extension();
    let urs_text = extract_upload(urs_bytes.clone(), extension.clone()).await?;
    let config = state.llm_config(req.config.as_ref());
    let test_steps = state
        .test_generation_use_case
        .generate_test_steps(&config, &urs_text)
        .await?;

    state.upload_sessions.create(NewUpload {
        urs_file_name: req.urs.file_name,
        urs_extension: extension,
        urs_bytes,
        urs_text,
        template_bytes,
        test_steps,
    })
}

#[post("/preview")]
async fn preview(data: web::Data<HttpState>, req: web::Json<PreviewRequest>) -> impl Responder {
    let req = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "Generate",
        &format!("Previewing test steps for {}", req.urs.file_name),
    );

    match open_preview(&data.app_state, req).await {
        Ok(summary) => {
            add_log(
                &data.logs,
                "INFO",
                "Generate",
                &format!(
                    "Session {} holds {} steps",
                    summary.session_id,
                    summary.test_steps.len()
                ),
            );
            HttpResponse::Ok().json(summary)
        }
        Err(e) => failure(&data.logs, "Generate", "Preview failed", e),
    }
}

async fn generate_script(state: &AppState, req: GenerateRequest) -> Result<Vec<u8>> {
    let max_bytes = state.config.limits.max_upload_bytes;
    let urs_bytes = req.urs.decode(max_bytes)?;
    let template_bytes = decode_template(&req.template, max_bytes)?;

    let urs_text = extract_upload(urs_bytes, req.urs.extension()).await?;
    let config = state.llm_config(req.config.as_ref());
    let steps = state
        .test_generation_use_case
        .generate_test_steps(&config, &urs_text)
        .await?;
    populate_blocking(template_bytes, steps).await
}

#[post("/generate")]
async fn generate(data: web::Data<HttpState>, req: web::Json<GenerateRequest>) -> impl Responder {
    let req = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "Generate",
        &format!(
            "Generating test script from {} into {}",
            req.urs.file_name, req.template.file_name
        ),
    );

    match generate_script(&data.app_state, req).await {
        Ok(bytes) => attachment(bytes, "generated_test_script.docx", DOCX_CONTENT_TYPE),
        Err(e) => failure(&data.logs, "Generate", "Generation failed", e),
    }
}

#[put("/sessions/{id}/steps")]
async fn update_session_steps(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<UpdateStepsRequest>,
) -> impl Responder {
    let id = path.into_inner();
    match data
        .app_state
        .upload_sessions
        .update_steps(&id, req.into_inner().test_steps)
    {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => failure(&data.logs, "Session", "Step update rejected", e),
    }
}

async fn render_session(state: &AppState, id: &str, req: RenderRequest) -> Result<Vec<u8>> {
    let session = state.upload_sessions.get(id)?;
    let template_bytes: Arc<[u8]> = match (&req.template, session.template_bytes) {
        (Some(template), _) => {
            decode_template(template, state.config.limits.max_upload_bytes)?.into()
        }
        (None, Some(stored)) => stored,
        (None, None) => {
            return Err(AppError::ValidationError(
                "no template uploaded for this session".to_string(),
            ))
        }
    };
    populate_blocking(template_bytes, session.test_steps).await
}

#[post("/sessions/{id}/render")]
async fn render(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: Option<web::Json<RenderRequest>>,
) -> impl Responder {
    let id = path.into_inner();
    let req = req.map(|r| r.into_inner()).unwrap_or_default();

    match render_session(&data.app_state, &id, req).await {
        Ok(bytes) => {
            add_log(&data.logs, "INFO", "Session", &format!("Rendered session {}", id));
            attachment(bytes, "generated_test_script.docx", DOCX_CONTENT_TYPE)
        }
        Err(e) => failure(&data.logs, "Session", "Render failed", e),
    }
}

#[delete("/sessions/{id}")]
async fn discard_session(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    match data.app_state.upload_sessions.take(&path) {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(e) => failure(&data.logs, "Session", "Discard failed", e),
    }
}

async fn build_session_package(state: &AppState, id: &str, req: AuditRequest) -> Result<AuditPackage> {
    let session = state.upload_sessions.get(id)?;

    let mut quality_report = None;
    let mut quality_check_error = None;
    if req.include_quality_check {
        let config = state.llm_config(req.config.as_ref());
        match state
            .quality_check_use_case
            .analyze_requirements(&config, &session.urs_text)
            .await
        {
            Ok(report) => quality_report = Some(report),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Quality check failed, packaging without it");
                quality_check_error = Some(e.to_string());
            }
        }
    }

    let mut change_analysis = None;
    let mut change_analysis_error = None;
    if let Some(project) = req.project_name.as_deref() {
        match state.change_analyzer_use_case.analyze_against_latest(
            project,
            &session.urs_text,
            &session.test_steps,
        ) {
            Ok(analysis) => change_analysis = Some(analysis),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Change analysis failed, packaging without it");
                change_analysis_error = Some(e.to_string());
            }
        }
    }

    let execution_results = req.execution_results;
    web::block(move || {
        let input = AuditPackageInput {
            urs_source: Some(UrsSource {
                bytes: &session.urs_bytes,
                extension: &session.urs_extension,
            }),
            urs_text: &session.urs_text,
            test_steps: &session.test_steps,
            template: session.template_bytes.as_deref(),
            quality_report: quality_report.as_ref(),
            change_analysis: change_analysis.as_ref(),
            execution_results,
            quality_check_error: quality_check_error.as_deref(),
            change_analysis_error: change_analysis_error.as_deref(),
        };
        build_audit_package(&input, Local::now())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Audit package task failed: {}", e)))?
}

#[post("/sessions/{id}/audit-package")]
async fn audit_package(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: Option<web::Json<AuditRequest>>,
) -> impl Responder {
    let id = path.into_inner();
    let req = req.map(|r| r.into_inner()).unwrap_or_default();
    add_log(&data.logs, "INFO", "Audit", &format!("Building audit package for session {}", id));

    match build_session_package(&data.app_state, &id, req).await {
        Ok(package) => {
            add_log(
                &data.logs,
                if package.metadata.omitted.is_empty() { "INFO" } else { "WARN" },
                "Audit",
                &format!(
                    "{} ready with {} artifacts, {} omitted",
                    package.file_name,
                    package.metadata.artifacts.len(),
                    package.metadata.omitted.len()
                ),
            );
            attachment(package.bytes, &package.file_name, ZIP_CONTENT_TYPE)
        }
        Err(e) => failure(&data.logs, "Audit", "Audit package failed", e),
    }
}

async fn check_quality(state: &AppState, req: QualityRequest) -> Result<QualityReport> {
    let urs_text = match (req.urs, req.urs_text) {
        (Some(file), _) => {
            let bytes = file.decode(state.config.limits.max_upload_bytes)?;
            extract_upload(bytes, file.extension()).await?
        }
        (None, Some(text)) if !text.trim().is_empty() => text,
        _ => {
            return Err(AppError::ValidationError(
                "provide either a URS file or URS text".to_string(),
            ))
        }
    };
    let config = state.llm_config(req.config.as_ref());
    state
        .quality_check_use_case
        .analyze_requirements(&config, &urs_text)
        .await
}

#[post("/quality")]
async fn quality(data: web::Data<HttpState>, req: web::Json<QualityRequest>) -> impl Responder {
    add_log(&data.logs, "INFO", "Quality", "Running requirements quality check");
    match check_quality(&data.app_state, req.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => failure(&data.logs, "Quality", "Quality check failed", e),
    }
}

#[post("/baselines")]
async fn save_baseline(data: web::Data<HttpState>, req: web::Json<BaselineRequest>) -> impl Responder {
    let req = req.into_inner();
    let saved: Result<Baseline> = validate_steps(&req.test_steps).and_then(|_| {
        data.app_state
            .change_analyzer_use_case
            .save_baseline(&req.urs_text, &req.test_steps, &req.project_name)
    });
    match saved {
        Ok(baseline) => {
            add_log(
                &data.logs,
                "INFO",
                "Baselines",
                &format!("Saved baseline {}", baseline.baseline_id),
            );
            HttpResponse::Created().json(baseline)
        }
        Err(e) => failure(&data.logs, "Baselines", "Saving baseline failed", e),
    }
}

#[get("/baselines/{project}")]
async fn list_baselines(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    match data.app_state.change_analyzer_use_case.list_baselines(&path) {
        Ok(ids) => HttpResponse::Ok().json(ids),
        Err(e) => failure(&data.logs, "Baselines", "Listing baselines failed", e),
    }
}

#[get("/baselines/{project}/latest")]
async fn latest_baseline(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let project = path.into_inner();
    let latest = data
        .app_state
        .change_analyzer_use_case
        .latest_baseline(&project)
        .and_then(|found| {
            found.ok_or_else(|| AppError::NotFound(format!("no baseline for project '{}'", project)))
        });
    match latest {
        Ok(baseline) => HttpResponse::Ok().json(baseline),
        Err(e) => failure(&data.logs, "Baselines", "Loading latest baseline failed", e),
    }
}

#[get("/baselines/{project}/{baseline_id}")]
async fn get_baseline(data: web::Data<HttpState>, path: web::Path<(String, String)>) -> impl Responder {
    let (project, baseline_id) = path.into_inner();
    let found = data
        .app_state
        .change_analyzer_use_case
        .get_baseline(&baseline_id)
        .and_then(|baseline| {
            if baseline.project_name == project {
                Ok(baseline)
            } else {
                Err(AppError::NotFound(format!(
                    "baseline '{}' in project '{}'",
                    baseline_id, project
                )))
            }
        });
    match found {
        Ok(baseline) => HttpResponse::Ok().json(baseline),
        Err(e) => failure(&data.logs, "Baselines", "Loading baseline failed", e),
    }
}

#[post("/changes")]
async fn analyze_changes(data: web::Data<HttpState>, req: web::Json<BaselineRequest>) -> impl Responder {
    let req = req.into_inner();
    let analysis: Result<ChangeAnalysis> = validate_steps(&req.test_steps).and_then(|_| {
        data.app_state.change_analyzer_use_case.analyze_against_latest(
            &req.project_name,
            &req.urs_text,
            &req.test_steps,
        )
    });
    match analysis {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => failure(&data.logs, "Changes", "Change analysis failed", e),
    }
}

#[post("/rtm/xlsx")]
async fn rtm_xlsx(data: web::Data<HttpState>, req: web::Json<StepsRequest>) -> impl Responder {
    match validate_steps(&req.test_steps).and_then(|_| generate_rtm_xlsx(&req.test_steps)) {
        Ok(bytes) => attachment(bytes, &format!("RTM_{}.xlsx", file_stamp()), XLSX_CONTENT_TYPE),
        Err(e) => failure(&data.logs, "RTM", "RTM workbook failed", e),
    }
}

#[post("/rtm/docx")]
async fn rtm_docx(data: web::Data<HttpState>, req: web::Json<StepsRequest>) -> impl Responder {
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    match validate_steps(&req.test_steps).and_then(|_| generate_rtm_docx(&req.test_steps, &generated_at)) {
        Ok(bytes) => attachment(bytes, &format!("RTM_{}.docx", file_stamp()), DOCX_CONTENT_TYPE),
        Err(e) => failure(&data.logs, "RTM", "RTM document failed", e),
    }
}

#[post("/validation/plan")]
async fn validation_plan(data: web::Data<HttpState>, req: web::Json<StepsRequest>) -> impl Responder {
    let today = Local::now().format("%Y-%m-%d").to_string();
    match validate_steps(&req.test_steps).and_then(|_| generate_validation_plan(&req.test_steps, &today)) {
        Ok(bytes) => attachment(
            bytes,
            &format!("Validation_Plan_{}.docx", file_stamp()),
            DOCX_CONTENT_TYPE,
        ),
        Err(e) => failure(&data.logs, "Validation", "Validation plan failed", e),
    }
}

#[post("/validation/summary")]
async fn validation_summary(data: web::Data<HttpState>, req: web::Json<SummaryRequest>) -> impl Responder {
    let today = Local::now().format("%Y-%m-%d").to_string();
    let generated = validate_steps(&req.test_steps).and_then(|_| {
        generate_validation_summary(&req.test_steps, req.execution_results, &today)
    });
    match generated {
        Ok(bytes) => attachment(
            bytes,
            &format!("Validation_Summary_{}.docx", file_stamp()),
            DOCX_CONTENT_TYPE,
        ),
        Err(e) => failure(&data.logs, "Validation", "Validation summary failed", e),
    }
}

fn provider_from_path(name: &str) -> Result<LLMProvider> {
    LLMProvider::from_account(name)
        .ok_or_else(|| AppError::ValidationError(format!("unknown provider '{}'", name)))
}

#[put("/settings/api-key/{provider}")]
async fn store_api_key(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<ApiKeyRequest>,
) -> impl Responder {
    let stored = provider_from_path(&path).and_then(|provider| {
        if req.api_key.trim().is_empty() {
            return Err(AppError::ValidationError("api_key must not be empty".to_string()));
        }
        data.app_state
            .config_service
            .save_api_key(provider, req.api_key.trim())
    });
    match stored {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Settings", &format!("Stored API key for {}", path));
            HttpResponse::NoContent().finish()
        }
        Err(e) => failure(&data.logs, "Settings", "Storing API key failed", e),
    }
}

#[delete("/settings/api-key/{provider}")]
async fn forget_api_key(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let removed = provider_from_path(&path)
        .and_then(|provider| data.app_state.config_service.delete_api_key(provider));
    match removed {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Settings", &format!("Removed API key for {}", path));
            HttpResponse::NoContent().finish()
        }
        Err(e) => failure(&data.logs, "Settings", "Removing API key failed", e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(&*logs),
        Err(_) => HttpResponse::InternalServerError().body("log buffer is poisoned"),
    }
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(preview)
            .service(generate)
            .service(update_session_steps)
            .service(render)
            .service(discard_session)
            .service(audit_package)
            .service(quality)
            .service(save_baseline)
            .service(list_baselines)
            .service(latest_baseline)
            .service(get_baseline)
            .service(analyze_changes)
            .service(rtm_xlsx)
            .service(rtm_docx)
            .service(validation_plan)
            .service(validation_summary)
            .service(store_api_key)
            .service(forget_api_key)
            .service(get_logs),
    );
}

/// Base64 inflates by a third and a request may carry two files.
fn json_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.saturating_mul(3)
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;
    let limit = json_limit(app_state.config.limits.max_upload_bytes);
    let state = web::Data::new(HttpState { app_state, logs });

    add_log(
        &state.logs,
        "INFO",
        "System",
        &format!("HTTP API listening on {}:{}", host, port),
    );

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(limit))
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run();

    Ok(server)
}
