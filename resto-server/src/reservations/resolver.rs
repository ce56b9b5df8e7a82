//! Reservation conflict resolver
//!
//! 同一目标（桌台或区域）同一日期只能有一个进行中的预订（pending/confirmed）。
//! 冲突只针对其他顾客：同一顾客重复提交时原地更新已有预订并保留确认码。
//! 索引 `reservation_slots` 的键为 `"{date}|{target}"`，预订进入终态时移除。

use chrono::NaiveDate;
use redb::{ReadableTable, WriteTransaction};
use shared::error::ErrorCode;
use shared::message::DomainEvent;
use shared::models::{
    Actor, Availability, Reservation, ReservationCreate, ReservationQuery, ReservationStatus,
    ReservationTarget,
};
use shared::util::{now_millis, reservation_code};

use super::pricing::ReservationPricing;
use crate::db::Store;
use crate::db::storage::{RESERVATIONS, RESERVATION_CODES, RESERVATION_SLOTS, get_json, put_json};
use crate::error::{AllocationError, AllocationResult, Entity};
use crate::events::EventHub;
use crate::tables::TableAllocator;

const MAX_CODE_ATTEMPTS: usize = 8;
const DEFAULT_LIST_LIMIT: usize = 50;

fn slot_key(date: NaiveDate, target: &ReservationTarget) -> String {
    format!("{}|{}", date, target.index_key())
}

/// Reservation booking and lifecycle
#[derive(Debug, Clone)]
pub struct ReservationResolver {
    store: Store,
    tables: TableAllocator,
    pricing: ReservationPricing,
    events: EventHub,
}

impl ReservationResolver {
    pub fn new(
        store: Store,
        tables: TableAllocator,
        pricing: ReservationPricing,
        events: EventHub,
    ) -> Self {
        Self {
            store,
            tables,
            pricing,
            events,
        }
    }

    /// Whether `target` is free on `date` for `requester`
    ///
    /// Reservations of the requester never count as conflicts.
    pub fn check_availability(
        &self,
        date: NaiveDate,
        target: &ReservationTarget,
        requester: Option<i64>,
    ) -> AllocationResult<Availability> {
        let txn = self.store.begin_read()?;
        let slots = txn.open_table(RESERVATION_SLOTS)?;
        let reservations = txn.open_table(RESERVATIONS)?;
        let holders = active_in_slot(&slots, &reservations, &slot_key(date, target))?;

        Ok(
            match holders
                .iter()
                .find(|r| Some(r.customer_id) != requester)
            {
                Some(other) => Availability::taken(other.code.clone()),
                None => Availability::free(),
            },
        )
    }

    /// Book a reservation, or update the requester's existing one for the
    /// same target and date
    pub fn create_reservation(
        &self,
        actor: &Actor,
        input: ReservationCreate,
    ) -> AllocationResult<Reservation> {
        if input.party_size < 1 {
            return Err(AllocationError::validation(
                ErrorCode::PartySizeInvalid,
                "Party size must be at least 1",
            ));
        }
        if input.service.is_some_and(|s| s.duration_hours == Some(0)) {
            return Err(AllocationError::validation(
                ErrorCode::ValueOutOfRange,
                "Service duration must be at least 1 hour",
            ));
        }
        let price = input
            .service
            .map(|service| self.pricing.price(&service, input.party_size));

        let txn = self.store.begin_write()?;

        if let Some(ReservationTarget::Table { table_id }) = input.target {
            let table = self
                .tables
                .get_table_txn(&txn, table_id)?
                .ok_or(AllocationError::not_found(Entity::Table, table_id))?;
            if !table.enabled {
                return Err(AllocationError::validation(
                    ErrorCode::TableDisabled,
                    format!("Table {} is disabled", table.name),
                ));
            }
            if i64::from(input.party_size) > i64::from(table.capacity) {
                return Err(AllocationError::validation(
                    ErrorCode::CapacityExceeded,
                    format!(
                        "Party of {} exceeds capacity {} of table {}",
                        input.party_size, table.capacity, table.name
                    ),
                ));
            }
        }

        let slot = input.target.as_ref().map(|t| slot_key(input.date, t));
        let existing = match &slot {
            Some(slot) => {
                let slots = txn.open_table(RESERVATION_SLOTS)?;
                let reservations = txn.open_table(RESERVATIONS)?;
                let holders = active_in_slot(&slots, &reservations, slot)?;
                if let Some(other) = holders.iter().find(|r| r.customer_id != actor.id) {
                    tracing::info!(
                        slot = %slot,
                        conflicting_code = %other.code,
                        "Reservation conflict"
                    );
                    return Err(AllocationError::ReservationConflict(other.code.clone()));
                }
                holders.into_iter().next()
            }
            None => None,
        };

        let now = now_millis();

        // Same customer, same target and date: update in place
        if let Some(mut reservation) = existing {
            reservation.time = input.time;
            reservation.party_size = input.party_size;
            reservation.contact = input.contact;
            reservation.notes = input.notes;
            reservation.service = input.service;
            reservation.price = price;
            reservation.updated_at = now;
            {
                let mut reservations = txn.open_table(RESERVATIONS)?;
                put_json(&mut reservations, reservation.id, &reservation)?;
            }
            txn.commit()?;

            tracing::info!(
                reservation_id = reservation.id,
                code = %reservation.code,
                "Reservation updated in place"
            );
            self.events.publish(DomainEvent::ReservationUpdated {
                reservation_id: reservation.id,
                code: reservation.code.clone(),
                customer_id: reservation.customer_id,
                date: reservation.date,
                party_size: reservation.party_size,
            });
            return Ok(reservation);
        }

        let code = self.unique_code(&txn)?;
        let reservation = Reservation {
            id: self.store.next_id(&txn)?,
            code,
            customer_id: actor.id,
            date: input.date,
            time: input.time,
            party_size: input.party_size,
            target: input.target,
            status: ReservationStatus::Pending,
            contact: input.contact,
            notes: input.notes,
            service: input.service,
            price,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        {
            let mut reservations = txn.open_table(RESERVATIONS)?;
            put_json(&mut reservations, reservation.id, &reservation)?;
            let mut codes = txn.open_table(RESERVATION_CODES)?;
            codes.insert(reservation.code.as_str(), reservation.id)?;
            if let Some(slot) = &slot {
                let mut slots = txn.open_table(RESERVATION_SLOTS)?;
                slots.insert((slot.as_str(), reservation.id), ())?;
            }
        }
        if let Some(ReservationTarget::Table { table_id }) = reservation.target {
            self.tables.add_reference_txn(&txn, table_id, reservation.id)?;
        }
        txn.commit()?;

        tracing::info!(
            reservation_id = reservation.id,
            code = %reservation.code,
            customer_id = reservation.customer_id,
            date = %reservation.date,
            "Reservation created"
        );
        self.events.publish(DomainEvent::ReservationCreated {
            reservation_id: reservation.id,
            code: reservation.code.clone(),
            customer_id: reservation.customer_id,
            date: reservation.date,
        });
        Ok(reservation)
    }

    /// Move a reservation to `target`
    ///
    /// Customers may only cancel their own; staff drive every other change.
    pub fn transition(
        &self,
        actor: &Actor,
        id: i64,
        target: ReservationStatus,
    ) -> AllocationResult<Reservation> {
        let txn = self.store.begin_write()?;
        let (mut reservation, from) = {
            let reservations = txn.open_table(RESERVATIONS)?;
            let reservation: Reservation = get_json(&reservations, id)?
                .ok_or(AllocationError::not_found(Entity::Reservation, id))?;
            let from = reservation.status;
            (reservation, from)
        };

        if !actor.role.is_staff() {
            if reservation.customer_id != actor.id {
                return Err(AllocationError::forbidden(
                    "Reservation belongs to another customer",
                ));
            }
            if target != ReservationStatus::Cancelled {
                return Err(AllocationError::forbidden(
                    "Customers may only cancel their reservations",
                ));
            }
        }
        if !from.can_transition_to(target) {
            return Err(AllocationError::transition(from, target));
        }

        let now = now_millis();
        reservation.status = target;
        reservation.updated_at = now;
        if target == ReservationStatus::Cancelled {
            reservation.cancelled_at = Some(now);
        }
        {
            let mut reservations = txn.open_table(RESERVATIONS)?;
            put_json(&mut reservations, id, &reservation)?;
        }
        if let (false, Some(t)) = (target.is_active(), &reservation.target) {
            let slot = slot_key(reservation.date, t);
            let mut slots = txn.open_table(RESERVATION_SLOTS)?;
            slots.remove((slot.as_str(), id))?;
        }
        txn.commit()?;

        tracing::info!(
            reservation_id = id,
            code = %reservation.code,
            from = %from,
            to = %target,
            actor_id = actor.id,
            "Reservation status changed"
        );
        self.events.publish(DomainEvent::ReservationStatusChanged {
            reservation_id: id,
            code: reservation.code.clone(),
            from,
            to: target,
        });
        Ok(reservation)
    }

    pub fn cancel(&self, actor: &Actor, id: i64) -> AllocationResult<Reservation> {
        self.transition(actor, id, ReservationStatus::Cancelled)
    }

    pub fn get_reservation(&self, actor: &Actor, id: i64) -> AllocationResult<Reservation> {
        let txn = self.store.begin_read()?;
        let reservations = txn.open_table(RESERVATIONS)?;
        let reservation: Reservation = get_json(&reservations, id)?
            .ok_or(AllocationError::not_found(Entity::Reservation, id))?;
        if !actor.can_view(reservation.customer_id) {
            return Err(AllocationError::forbidden(
                "Reservation belongs to another customer",
            ));
        }
        Ok(reservation)
    }

    /// Reservations visible to the actor, newest first
    pub fn list_reservations(
        &self,
        actor: &Actor,
        query: &ReservationQuery,
    ) -> AllocationResult<Vec<Reservation>> {
        let txn = self.store.begin_read()?;
        let reservations = txn.open_table(RESERVATIONS)?;

        let mut out = Vec::new();
        for result in reservations.iter()? {
            let (_, value) = result?;
            let reservation: Reservation = serde_json::from_slice(value.value())?;
            if !actor.can_view(reservation.customer_id)
                || query.date.is_some_and(|d| d != reservation.date)
                || query.status.is_some_and(|s| s != reservation.status)
            {
                continue;
            }
            out.push(reservation);
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(query.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(out)
    }

    fn unique_code(&self, txn: &WriteTransaction) -> AllocationResult<String> {
        let codes = txn.open_table(RESERVATION_CODES)?;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = reservation_code();
            if codes.get(code.as_str())?.is_none() {
                return Ok(code);
            }
            tracing::warn!(code = %code, "Reservation code collision, retrying");
        }
        Err(AllocationError::validation(
            ErrorCode::CodeGenerationFailed,
            "Could not generate a unique reservation code",
        ))
    }
}

/// Active reservations indexed under one slot
fn active_in_slot(
    slots: &impl ReadableTable<(&'static str, i64), ()>,
    reservations: &impl ReadableTable<i64, &'static [u8]>,
    slot: &str,
) -> AllocationResult<Vec<Reservation>> {
    let mut out = Vec::new();
    for result in slots.range((slot, i64::MIN)..=(slot, i64::MAX))? {
        let (key, _) = result?;
        let id = key.value().1;
        match get_json::<Reservation>(reservations, id)? {
            Some(reservation) if reservation.status.is_active() => out.push(reservation),
            _ => {}
        }
    }
    Ok(out)
}
