//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Availability, Reservation, ReservationCreate, ReservationQuery, ReservationStatusUpdate,
    ReservationTarget, TableZone,
};

use crate::api::run_blocking;
use crate::auth::{CurrentActor, MaybeActor};
use crate::core::ServerState;

/// `?date=2025-12-24&table_id=5` or `?date=2025-12-24&zone=vip`
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub table_id: Option<i64>,
    pub zone: Option<TableZone>,
}

impl AvailabilityQuery {
    fn target(&self) -> AppResult<ReservationTarget> {
        match (self.table_id, self.zone) {
            (Some(table_id), None) => Ok(ReservationTarget::Table { table_id }),
            (None, Some(zone)) => Ok(ReservationTarget::Zone { zone }),
            _ => Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                "Specify exactly one of table_id or zone",
            )),
        }
    }
}

/// POST /api/reservations
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<Json<Reservation>> {
    let reservations = state.reservations.clone();
    let reservation =
        run_blocking(move || reservations.create_reservation(&actor, payload)).await?;
    Ok(Json(reservation))
}

/// GET /api/reservations/availability
pub async fn availability(
    State(state): State<ServerState>,
    MaybeActor(actor): MaybeActor,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let target = query.target()?;
    let requester = actor.map(|a| a.id);
    let reservations = state.reservations.clone();
    let availability =
        run_blocking(move || reservations.check_availability(query.date, &target, requester))
            .await?;
    Ok(Json(availability))
}

/// GET /api/reservations
pub async fn list(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state.reservations.clone();
    let list = run_blocking(move || reservations.list_reservations(&actor, &query)).await?;
    Ok(Json(list))
}

/// GET /api/reservations/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let reservations = state.reservations.clone();
    let reservation = run_blocking(move || reservations.get_reservation(&actor, id)).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let reservations = state.reservations.clone();
    let reservation = run_blocking(move || reservations.cancel(&actor, id)).await?;
    Ok(Json(reservation))
}

/// PUT /api/reservations/{id}/state
pub async fn update_state(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationStatusUpdate>,
) -> AppResult<Json<Reservation>> {
    let reservations = state.reservations.clone();
    let reservation =
        run_blocking(move || reservations.transition(&actor, id, payload.status)).await?;
    Ok(Json(reservation))
}
