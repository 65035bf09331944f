use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::MashupError;
use crate::headlines::HeadlineRecord;
use crate::matchmaker::Pairing;
use crate::service::{MixerService, Vote};

const TOP_N: usize = 5;
const MAX_TILT_DEG: i32 = 35;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MixerService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(front_page))
        .route("/health", get(|| async { "ok" }))
        .route("/api", get(api_pairing))
        .route("/api/voteup", post(vote_up))
        .route("/api/votedown", post(vote_down))
        .route("/api/top5", get(top5))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: msg.into() })).into_response()
}

fn pairing_error(e: MashupError) -> Response {
    tracing::warn!(error = %e, "no pairing available");
    if e.is_retryable() {
        error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    } else {
        error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

// ThreadRng is not Send; keep it out of any await.
fn draw(state: &AppState) -> Result<(Pairing, i32), MashupError> {
    let mut rng = rand::rng();
    let pairing = state.service.get_pairing(&mut rng)?;
    let tilt = rng.random_range(-MAX_TILT_DEG..MAX_TILT_DEG);
    Ok((pairing, tilt))
}

#[derive(Serialize)]
struct PairingOut {
    headline: String,
    urls: [String; 2],
    token: String,
}

async fn api_pairing(State(state): State<AppState>) -> Response {
    match draw(&state) {
        Ok((p, _)) => Json(PairingOut {
            headline: p.title(),
            urls: [p.first.url.clone(), p.second.url.clone()],
            token: p.token,
        })
        .into_response(),
        Err(e) => pairing_error(e),
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: String,
}

#[derive(Serialize)]
struct VoteOut {
    message: &'static str,
    token: String,
}

async fn vote(state: AppState, token: String, vote: Vote) -> Response {
    if token.is_empty() {
        return error(StatusCode::BAD_REQUEST, "You've provided no 'token'.");
    }
    // votes persist a snapshot (blocking file I/O)
    let svc = state.service.clone();
    let t = token.clone();
    let ok = tokio::task::spawn_blocking(move || match vote {
        Vote::Up => svc.vote_up(&t),
        Vote::Down => svc.vote_down(&t),
    })
    .await
    .unwrap_or(false);

    if !ok {
        return error(StatusCode::NOT_FOUND, "No such token.");
    }
    let message = match vote {
        Vote::Up => "Headline voted up!",
        Vote::Down => "Headline voted down!",
    };
    Json(VoteOut { message, token }).into_response()
}

async fn vote_up(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Response {
    vote(state, q.token, Vote::Up).await
}

async fn vote_down(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Response {
    vote(state, q.token, Vote::Down).await
}

#[derive(Serialize)]
struct TopOut {
    headlines: Vec<HeadlineRecord>,
}

async fn top5(State(state): State<AppState>) -> Json<TopOut> {
    Json(TopOut {
        headlines: state.service.top_headlines(TOP_N),
    })
}

async fn front_page(State(state): State<AppState>) -> Response {
    match draw(&state) {
        Ok((p, tilt)) => Html(render_page(&p, tilt)).into_response(),
        Err(e) => pairing_error(e),
    }
}

fn render_page(p: &Pairing, tilt: i32) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
<title>{title}</title>
<meta charset="utf-8" />
<link rel="stylesheet" href="/media/styles.css" />
</head>
<body>
<div id="headline" data-token="{token}" style="transform: rotate({tilt}deg);">{markup}</div>
</body>
</html>"#,
        title = html_escape::encode_text(&p.title()),
        token = p.token,
        tilt = tilt,
        markup = p.markup(),
    )
}
