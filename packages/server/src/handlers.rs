//! HTTP handler functions for the crime oracle API.

use actix_web::{HttpResponse, web};
use crime_oracle_assistant::{
    AssistantRequest, Briefing, ChatTurn, Role, answer_or_fallback, system_instruction,
};
use crime_oracle_hotspot_models::HotspotTier;
use crime_oracle_overlay::MapLayers;
use crime_oracle_server_models::{
    ApiChatRole, ApiError, ApiHealth, ApiSummary, AskRequest, AskResponse, OverlayQueryParams,
    PredictQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/summary`
pub async fn summary(state: web::Data<AppState>) -> HttpResponse {
    let hotspots = &state.partition.hotspots;
    HttpResponse::Ok().json(ApiSummary {
        incidents: state.dataset.incidents.len(),
        hotspots: hotspots.len(),
        high_risk_hotspots: hotspots
            .iter()
            .filter(|h| h.tier == HotspotTier::High)
            .count(),
        stations: state.dataset.stations.len(),
        center: crime_oracle_overlay::map_center(&state.dataset.incidents),
    })
}

/// `GET /api/hotspots`
pub async fn hotspots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.partition.hotspots)
}

/// `GET /api/stations`
pub async fn stations(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&*state.dataset.stations)
}

/// `GET /api/predict`
///
/// Projects every hotspot onto `date`, or tomorrow when absent.
pub async fn predict(
    state: web::Data<AppState>,
    params: web::Query<PredictQueryParams>,
) -> HttpResponse {
    let date = params.date.unwrap_or_else(crime_oracle_projection::tomorrow);

    match state.project(date) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            log::warn!("Prediction for {date} rejected: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
    }
}

/// `GET /api/overlay`
///
/// Returns every map layer as one GeoJSON `FeatureCollection`. Predicted
/// risk rings are included only when `date` is given.
pub async fn overlay(
    state: web::Data<AppState>,
    params: web::Query<OverlayQueryParams>,
) -> HttpResponse {
    let report = match params.date.map(|date| state.project(date)).transpose() {
        Ok(report) => report,
        Err(e) => {
            log::warn!("Overlay prediction rejected: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
        }
    };

    let layers = MapLayers {
        incidents: &state.dataset.incidents,
        hotspots: &state.partition.hotspots,
        stations: &state.dataset.stations,
        report: report.as_ref(),
    };

    HttpResponse::Ok().json(layers.to_feature_collection())
}

/// `POST /api/assistant/ask`
///
/// Answers a question about the hotspots and, when `date` is given, the
/// prediction for that date. Falls back to canned replies when no remote
/// assistant is configured or it fails.
pub async fn assistant_ask(
    state: web::Data<AppState>,
    body: web::Json<AskRequest>,
) -> HttpResponse {
    let AskRequest {
        question,
        date,
        history,
    } = body.into_inner();

    if question.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("question must not be empty"));
    }

    let report = match date.map(|date| state.project(date)).transpose() {
        Ok(report) => report,
        Err(e) => {
            log::warn!("Assistant prediction rejected: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
        }
    };

    let briefing = Briefing {
        hotspots: state.partition.hotspots.clone(),
        report,
    };

    let request = AssistantRequest {
        system_instruction: system_instruction(&briefing),
        prompt: question,
        history: history
            .into_iter()
            .map(|message| ChatTurn {
                role: match message.role {
                    ApiChatRole::User => Role::User,
                    ApiChatRole::Assistant => Role::Assistant,
                },
                text: message.text,
            })
            .collect(),
        grounded: true,
    };

    let reply = answer_or_fallback(state.assistant.as_deref(), &request, &briefing).await;

    HttpResponse::Ok().json(AskResponse {
        answer: reply.text,
        citations: reply.citations,
    })
}
