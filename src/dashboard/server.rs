use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use super::{Page, PageView, Snapshot, ViewSettings, render_page};
use crate::climate::FanCommand;
use crate::command::CommandWriter;
use crate::db::{ControlStore, ReadingStore};
use crate::forecast::Forecaster;
use crate::report::history_csv;
use crate::resample::aggregate;
use crate::session::{Flash, SessionStore, session_cookie, session_id};

#[derive(Debug, Clone)]
pub struct AppState {
    pub readings: ReadingStore,
    pub controls: ControlStore,
    pub forecaster: Arc<Forecaster>,
    pub commands: CommandWriter,
    pub sessions: Arc<SessionStore>,
    pub settings: ViewSettings,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/page/home") }))
        .route("/page/{slug}", get(show_page))
        .route("/fan/{command}", post(send_fan_command))
        .route("/controls/setpoint", post(set_setpoint))
        .route("/controls/target", post(set_target))
        .route("/cold-warning/acknowledge", post(acknowledge_cold_warning))
        .route("/reports/history.csv", get(download_history))
        .with_state(state)
}

/// Failure of a page request; rendered as a plain 500 with the error chain.
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

type SessionCookie = AppendHeaders<[(axum::http::HeaderName, String); 1]>;

fn session(state: &AppState, headers: &HeaderMap) -> (Uuid, SessionCookie) {
    let (id, _) = state.sessions.get_or_create(session_id(headers));
    (id, AppendHeaders([(SET_COOKIE, session_cookie(id))]))
}

async fn load_snapshot(state: &AppState) -> Result<Snapshot> {
    if let Err(e) = state.forecaster.reload_if_changed().await {
        warn!("failed to reload forecasting model: {e:#}");
    }

    let readings = state
        .readings
        .fetch_all()
        .await
        .context("failed to fetch sensor readings")?;

    Snapshot::build(&readings, &state.forecaster)
}

async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Ok(page) = slug.parse::<Page>() else {
        return Ok((StatusCode::NOT_FOUND, format!("unknown page: {slug}")).into_response());
    };

    let (id, cookie) = session(&state, &headers);

    let snapshot = load_snapshot(&state).await?;
    let controls = state.controls.get().await?;
    let last_command = match state.commands.read().await {
        Ok(command) => command,
        Err(e) => {
            warn!(path = %state.commands.path().display(), error = %e, "failed to read fan command file");
            None
        }
    };

    let flash = state.sessions.take_flash(id);
    let (_, session) = state.sessions.get_or_create(Some(id));

    let html = render_page(&PageView {
        page,
        settings: state.settings,
        session: &session,
        flash: flash.as_ref(),
        controls,
        last_command,
        snapshot: &snapshot,
    })?;

    Ok((cookie, Html(html)).into_response())
}

#[derive(Debug, Deserialize)]
struct ReturnTo {
    return_to: Option<String>,
}

impl ReturnTo {
    fn page(&self) -> Page {
        self.return_to
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

async fn send_fan_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ReturnTo>,
) -> Result<Response, AppError> {
    let Ok(command) = command.parse::<FanCommand>() else {
        return Ok((StatusCode::NOT_FOUND, format!("unknown fan command: {command}")).into_response());
    };

    let (id, cookie) = session(&state, &headers);
    let outcome = state.commands.write(command).await;

    let flash = match (outcome.is_success(), command) {
        (true, FanCommand::On) => Flash::success("Kipas dihidupkan"),
        (true, FanCommand::Off) => Flash::success("Kipas dimatikan"),
        (false, FanCommand::On) => Flash::error(format!("Gagal menghidupkan kipas: {}", outcome.message)),
        (false, FanCommand::Off) => Flash::error(format!("Gagal mematikan kipas: {}", outcome.message)),
    };
    state.sessions.update(id, |s| s.flash = Some(flash));

    Ok((cookie, Redirect::to(&form.page().path())).into_response())
}

#[derive(Debug, Deserialize)]
struct TemperatureForm {
    celsius: f64,
    return_to: Option<String>,
}

async fn set_setpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TemperatureForm>,
) -> Result<Response, AppError> {
    let (id, cookie) = session(&state, &headers);

    let flash = match state.controls.set_setpoint(form.celsius).await {
        Ok(()) => Flash::success(format!("Suhu berhasil diatur ke {:.2} °C", form.celsius)),
        Err(e) => Flash::error(format!("Gagal mengatur suhu: {e:#}")),
    };
    state.sessions.update(id, |s| s.flash = Some(flash));

    let back = ReturnTo {
        return_to: form.return_to,
    };
    Ok((cookie, Redirect::to(&back.page().path())).into_response())
}

async fn set_target(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TemperatureForm>,
) -> Result<Response, AppError> {
    let (id, cookie) = session(&state, &headers);

    let flash = match state.controls.set_target(form.celsius).await {
        Ok(()) => Flash::success(format!("Suhu target berhasil diatur ke {:.2} °C", form.celsius)),
        Err(e) => Flash::error(format!("Gagal mengatur suhu target: {e:#}")),
    };
    state.sessions.update(id, |s| s.flash = Some(flash));

    let back = ReturnTo {
        return_to: form.return_to,
    };
    Ok((cookie, Redirect::to(&back.page().path())).into_response())
}

/// Switches the fan off and remembers, for this session only, that the cold
/// warning was dealt with.
async fn acknowledge_cold_warning(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, cookie) = session(&state, &headers);

    let outcome = state.commands.write(FanCommand::Off).await;
    state.sessions.update(id, |s| {
        s.cold_warning_acknowledged = true;
        if !outcome.is_success() {
            s.flash = Some(Flash::error(format!("Gagal mematikan kipas: {}", outcome.message)));
        }
    });

    (cookie, Redirect::to(&Page::Latest.path())).into_response()
}

async fn download_history(State(state): State<AppState>) -> Result<Response, AppError> {
    let readings = state
        .readings
        .fetch_all()
        .await
        .context("failed to fetch sensor readings")?;
    let csv = history_csv(&aggregate(&readings), state.settings.timezone)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"history.csv\""),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_to_falls_back_to_home() {
        let form = ReturnTo { return_to: None };
        assert_eq!(form.page(), Page::Home);

        let form = ReturnTo {
            return_to: Some("nowhere".into()),
        };
        assert_eq!(form.page(), Page::Home);

        let form = ReturnTo {
            return_to: Some("dashboard".into()),
        };
        assert_eq!(form.page(), Page::Overview);
    }
}
