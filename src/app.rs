#![cfg(feature = "web")]

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

use crate::cache::{Filter, RecordKey};
use crate::config::SheetConfig;
use crate::controller::{CloseReason, Controller};
use crate::error::CmsError;
use crate::record::{Record, RecordForm, Status};
use crate::sheet::{HttpSheetTransport, SheetAdapter, SheetTransport};
use crate::tokens::{self, TokenSet};

const STALE_FORM: &str = "This form is no longer open. Please try again.";
const MISSING_COMPONENT: &str = "That component no longer exists. Please refresh.";

pub struct AppState<T> {
    controller: Mutex<Controller<T>>,
    in_flight: AtomicBool,
    tokens: Option<TokenSet>,
}

impl<T> AppState<T> {
    pub fn new(controller: Controller<T>, tokens: Option<TokenSet>) -> Self {
        AppState {
            controller: Mutex::new(controller),
            in_flight: AtomicBool::new(false),
            tokens,
        }
    }

    /// The shared controller; mutating handlers also take the in-flight flag
    pub fn controller(&self) -> &Mutex<Controller<T>> {
        &self.controller
    }
}

/// Set while a save, delete or refresh runs; cleared on drop
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Deserialize)]
struct FilterQuery {
    category: Option<String>,
    status: Option<String>,
    q: Option<String>,
}

impl FilterQuery {
    fn is_present(&self) -> bool {
        self.category.is_some() || self.status.is_some() || self.q.is_some()
    }

    fn to_filter(&self) -> Filter {
        let category = self.category.as_deref().filter(|c| !c.is_empty());
        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<Status>().ok());
        Filter::new(category, status, self.q.as_deref().unwrap_or(""))
    }
}

#[derive(Deserialize)]
struct CloseForm {
    #[serde(default)]
    reason: CloseReason,
}

#[derive(Serialize)]
struct ComponentEntry<'a> {
    position: usize,
    row: usize,
    key: RecordKey,
    record: &'a Record,
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = match &self {
            CmsError::Busy | CmsError::InvalidState(_) => StatusCode::CONFLICT,
            CmsError::InvalidPosition { .. } => StatusCode::NOT_FOUND,
            CmsError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            CmsError::Transport { .. } | CmsError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the router over an already started controller
pub fn router<T: SheetTransport + 'static>(state: Arc<AppState<T>>) -> Router {
    Router::new()
        .route("/", get(index::<T>))
        .route("/static/cms.css", get(stylesheet))
        .route("/api/components", get(list_components::<T>))
        .route("/refresh", post(refresh::<T>))
        .route("/components", post(submit::<T>))
        .route("/components/new", get(open_create::<T>))
        .route("/components/:position/edit", get(open_edit::<T>))
        .route("/components/key/:key/edit", get(open_edit_key::<T>))
        .route("/components/delete", post(request_delete::<T>))
        .route("/components/delete/confirm", post(confirm_delete::<T>))
        .route("/components/delete/cancel", post(cancel_delete::<T>))
        .route("/modal/close", post(close_modal::<T>))
        .route("/tokens/colors", get(color_tokens::<T>))
        .route("/tokens/typography", get(typography_tokens::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect to the sheet, load it once and serve until the process stops
pub async fn run(
    config: SheetConfig,
    tokens: Option<TokenSet>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = HttpSheetTransport::new(&config)?;
    let mut controller = Controller::new(SheetAdapter::new(transport, config));

    // the page still renders (with the error notice) when the first load fails
    if let Err(e) = controller.start().await {
        warn!("starting without records: {}", e);
    }

    let state = Arc::new(AppState::new(controller, tokens));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Lock for a mutating action, or refuse when one is already running.
/// Readers holding the lock only delay the caller.
async fn claim<T>(
    state: &AppState<T>,
) -> Result<(InFlight<'_>, MutexGuard<'_, Controller<T>>), CmsError> {
    if state
        .in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        warn!("rejecting request while another operation is in flight");
        return Err(CmsError::Busy);
    }
    let flight = InFlight(&state.in_flight);
    Ok((flight, state.controller.lock().await))
}

fn back_to_grid() -> Redirect {
    Redirect::to("/")
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_str!("./static/cms.css"),
    )
}

async fn index<T: SheetTransport>(
    Query(query): Query<FilterQuery>,
    State(state): State<Arc<AppState<T>>>,
) -> Result<Html<String>, CmsError> {
    let mut controller = state.controller.lock().await;
    if query.is_present() {
        controller.set_filter(query.to_filter());
    }
    Ok(Html(controller.render()?))
}

async fn list_components<T: SheetTransport>(
    Query(query): Query<FilterQuery>,
    State(state): State<Arc<AppState<T>>>,
) -> Response {
    let controller = state.controller.lock().await;
    let filter = query.to_filter();
    let entries: Vec<ComponentEntry> = controller
        .cache()
        .iter()
        .enumerate()
        .filter(|(_, entry)| filter.matches(&entry.record))
        .map(|(position, entry)| ComponentEntry {
            position,
            row: entry.row,
            key: entry.key,
            record: &entry.record,
        })
        .collect();
    Json(entries).into_response()
}

async fn refresh<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
) -> Result<Redirect, CmsError> {
    let (_flight, mut controller) = claim(&state).await?;
    // failures are already queued as notices
    let _ = controller.refresh().await;
    Ok(back_to_grid())
}

async fn open_create<T: SheetTransport>(State(state): State<Arc<AppState<T>>>) -> Redirect {
    state.controller.lock().await.open_create();
    back_to_grid()
}

async fn open_edit<T: SheetTransport>(
    Path(position): Path<usize>,
    State(state): State<Arc<AppState<T>>>,
) -> Redirect {
    let mut controller = state.controller.lock().await;
    if let Err(e) = controller.open_edit(position) {
        controller.report(&e, MISSING_COMPONENT);
    }
    back_to_grid()
}

async fn open_edit_key<T: SheetTransport>(
    Path(key): Path<String>,
    State(state): State<Arc<AppState<T>>>,
) -> Redirect {
    let mut controller = state.controller.lock().await;
    let opened = key
        .parse::<RecordKey>()
        .map_err(|_| CmsError::InvalidState("malformed component key"))
        .and_then(|key| controller.open_edit_key(key));
    if let Err(e) = opened {
        controller.report(&e, MISSING_COMPONENT);
    }
    back_to_grid()
}

async fn close_modal<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
    Form(form): Form<CloseForm>,
) -> Redirect {
    state.controller.lock().await.close(form.reason);
    back_to_grid()
}

async fn submit<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
    Form(form): Form<RecordForm>,
) -> Result<Redirect, CmsError> {
    let (_flight, mut controller) = claim(&state).await?;
    // transport and configuration failures are queued as notices by the controller
    if let Err(e @ CmsError::InvalidState(_)) = controller.submit(form).await {
        controller.report(&e, STALE_FORM);
    }
    Ok(back_to_grid())
}

async fn request_delete<T: SheetTransport>(State(state): State<Arc<AppState<T>>>) -> Redirect {
    let mut controller = state.controller.lock().await;
    if let Err(e) = controller.request_delete() {
        controller.report(&e, STALE_FORM);
    }
    back_to_grid()
}

async fn cancel_delete<T: SheetTransport>(State(state): State<Arc<AppState<T>>>) -> Redirect {
    state.controller.lock().await.cancel_delete();
    back_to_grid()
}

async fn confirm_delete<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
) -> Result<Redirect, CmsError> {
    let (_flight, mut controller) = claim(&state).await?;
    if let Err(e @ CmsError::InvalidState(_)) = controller.confirm_delete().await {
        controller.report(&e, STALE_FORM);
    }
    Ok(back_to_grid())
}

async fn color_tokens<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
) -> Result<Html<String>, Response> {
    let tokens = state
        .tokens
        .as_ref()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no token file configured").into_response())?;
    tokens::color_palette(tokens)
        .map(Html)
        .map_err(IntoResponse::into_response)
}

async fn typography_tokens<T: SheetTransport>(
    State(state): State<Arc<AppState<T>>>,
) -> Result<Html<String>, Response> {
    let tokens = state
        .tokens
        .as_ref()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no token file configured").into_response())?;
    tokens::type_scale(tokens)
        .map(Html)
        .map_err(IntoResponse::into_response)
}
