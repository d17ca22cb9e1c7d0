// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live log streaming over WebSocket: catch-up-then-live handover via
//! `LogBus::stream_since`, forwarding each line as a JSON frame.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use hub_clock::Clock;
use hub_core::{IdGen, RunId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::http::runs::LogLine;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Auth token placeholder; real end-user auth is out of scope (see
    /// `CallerIdentity`), but the query param is accepted so clients don't
    /// need a different URL shape once auth lands.
    #[allow(dead_code)]
    pub token: Option<String>,
}

pub async fn stream_logs<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(run_id): Path<String>,
    Query(_query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let run_id: RunId = parse_id(&run_id, "run_id")?;
    state
        .engine
        .get_run(run_id)
        .ok_or_else(|| ApiError::not_found(format!("run {run_id}")))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, run_id)))
}

async fn handle_socket<C: Clock, G: IdGen>(mut socket: WebSocket, state: AppState<C, G>, run_id: RunId) {
    let mut rx = state.engine.log_bus().stream_since(state.engine.store(), run_id, 0);
    while let Some(log) = rx.recv().await {
        let frame = LogLine::from(log);
        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(_) => continue,
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }
}
