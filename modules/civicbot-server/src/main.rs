use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Form, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use civicbot_common::{Config, Department, IssueType, Report, ReportStatus};
use civicbot_engine::{
    ImageAnalyzer, InboundMessage, LocationResolver, MessageHandler, ResponseSynthesizer,
};
use civicbot_store::{DashboardStats, ReportFilter, ReportStore, SqliteStore};
use geocode_client::NominatimClient;

struct AppState {
    handler: MessageHandler<NominatimClient>,
    store: Arc<dyn ReportStore>,
}

// ---------------------------------------------------------------------------
// Webhook (messaging channel in, TwiML out)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TwilioWebhook {
    #[serde(rename = "From", default)]
    from: String,
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "MediaUrl0")]
    media_url: Option<String>,
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TwilioWebhook>,
) -> impl IntoResponse {
    let message = InboundMessage {
        sender_id: form.from,
        body: form.body,
        media_url: form.media_url.filter(|u| !u.is_empty()),
    };

    let reply = state.handler.handle(&message).await;

    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml_message(&reply),
    )
}

fn twiml_message(reply: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(reply)
    )
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Admin JSON API
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    issue_type: Option<String>,
    department: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ReportsPage {
    reports: Vec<Report>,
    total: u64,
    page: u32,
    page_size: u32,
}

async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<ReportsPage> {
    let filter = ReportFilter {
        status: params.status.as_deref().map(ReportStatus::from_str_loose),
        issue_type: params.issue_type.as_deref().map(IssueType::from_str_loose),
        department: params.department.as_deref().map(Department::from_str_loose),
        search: params.search.filter(|s| !s.trim().is_empty()),
    };
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(50).clamp(1, 500);

    let (reports, total) = state
        .store
        .list(&filter, page, page_size)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Report listing failed");
            (Vec::new(), 0)
        });

    Json(ReportsPage {
        reports,
        total,
        page,
        page_size,
    })
}

async fn report_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    let stats = state.store.stats().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Stats query failed");
        DashboardStats::default()
    });
    Json(stats)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("civicbot=info".parse()?))
        .init();

    info!("CivicBot server starting...");

    let config = Config::from_env();
    config.log_redacted();

    let store = SqliteStore::connect(&config.database_url).await?;
    store.migrate().await?;
    let store: Arc<dyn ReportStore> = Arc::new(store);

    let geocoder = NominatimClient::new(&config.geocoder_base_url, &config.geocoder_user_agent);
    let handler = MessageHandler::new(
        store.clone(),
        ImageAnalyzer::new(config.vision_api_key.as_deref()),
        LocationResolver::new(geocoder),
        ResponseSynthesizer::new(),
    );

    let state = Arc::new(AppState { handler, store });

    let app = Router::new()
        .route("/webhook", post(webhook))
        .route("/api/reports", get(list_reports))
        .route("/api/reports/stats", get(report_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr = addr.as_str(), "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
