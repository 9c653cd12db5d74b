use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, warn};

use crate::allocator::SeatAllocator;
use crate::error::{ReservationError, Result};
use crate::models::{Booking, BookingStatus};
use crate::store::{ReservationStore, SeatSwap, ShowRemoval};

/// Оркестратор бронирования — единственный писатель состояния
/// Booking/ShowSeat/Payment. Хранилище передаётся явно при создании, никакого
/// глобального соединения.
#[derive(Clone)]
pub struct BookingService<S> {
    store: Arc<S>,
    allocator: SeatAllocator<S>,
}

impl<S: ReservationStore> BookingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let allocator = SeatAllocator::new(store.clone());
        Self { store, allocator }
    }

    /// Аллокатор кандидатов для интерактивного слоя: тот выбирает место сам
    /// и затем зовёт `reassign_seat` отдельным вызовом.
    pub fn allocator(&self) -> &SeatAllocator<S> {
        &self.allocator
    }

    /// Создаёт бронь без мест. Все проверки идут до единственной вставки,
    /// частичного состояния не бывает.
    pub async fn create_booking(
        &self,
        bid: i64,
        status: BookingStatus,
        bdatetime: NaiveDateTime,
        seats: i32,
        sid: i64,
        email: &str,
    ) -> Result<()> {
        if seats < 1 {
            return Err(ReservationError::ConstraintViolation(format!(
                "declared seat count must be at least 1, got {seats}"
            )));
        }
        if self.store.booking_exists(bid).await? {
            return Err(ReservationError::duplicate("bid", bid));
        }
        if !self.store.show_exists(sid).await? {
            return Err(ReservationError::not_found("show", sid));
        }
        if !self.store.user_exists(email).await? {
            return Err(ReservationError::not_found("user", email));
        }

        self.store
            .insert_booking(&Booking {
                bid,
                status,
                bdatetime,
                seats,
                sid: Some(sid),
                email: email.to_string(),
            })
            .await?;
        info!(bid, sid, email, seats, "booking created");
        Ok(())
    }

    /// Прикрепляет место к брони CAS-захватом, не read-then-write: под гонкой
    /// ровно один победитель, проигравший получает `SeatUnavailable`, его
    /// состояние не меняется.
    pub async fn assign_seat(&self, bid: i64, ssid: i64) -> Result<()> {
        let booking = self
            .store
            .fetch_booking(bid)
            .await?
            .ok_or_else(|| ReservationError::not_found("booking", bid))?;
        let seat = self
            .store
            .fetch_seat(ssid)
            .await?
            .ok_or_else(|| ReservationError::not_found("seat", ssid))?;

        if booking.sid != Some(seat.sid) {
            return Err(ReservationError::ConstraintViolation(format!(
                "seat {ssid} does not belong to the show of booking {bid}"
            )));
        }

        // Заявленное число мест — верхняя граница прикреплений.
        let held = self.store.seats_held_by(bid).await?;
        if held >= i64::from(booking.seats) {
            return Err(ReservationError::ConstraintViolation(format!(
                "booking {bid} already holds its declared {} seats",
                booking.seats
            )));
        }

        if !self.store.claim_seat_if_free(ssid, bid).await? {
            return Err(ReservationError::SeatUnavailable { ssid });
        }
        info!(bid, ssid, "seat assigned");
        Ok(())
    }

    /// Пересаживает бронь на эквивалентное место одной транзакцией:
    /// освобождение + CAS-захват. Проигрыш гонки откатывает оба шага,
    /// исходное место не теряется.
    pub async fn reassign_seat(&self, bid: i64, from: i64, to: i64) -> Result<()> {
        let seat = self
            .store
            .fetch_seat(from)
            .await?
            .ok_or_else(|| ReservationError::not_found("seat", from))?;
        if seat.bid != Some(bid) {
            return Err(ReservationError::ConstraintViolation(format!(
                "seat {from} is not held by booking {bid}"
            )));
        }

        let candidates = self.allocator.find_equivalent_free_seats(from).await?;
        if !candidates.iter().any(|s| s.ssid == to) {
            return Err(ReservationError::ConstraintViolation(format!(
                "seat {to} is not an equivalent free seat for {from}"
            )));
        }

        match self.store.swap_seat(bid, from, to).await? {
            SeatSwap::Swapped => {
                info!(bid, from, to, "seats swapped");
                Ok(())
            }
            // Предусловие испарилось между проверкой и транзакцией.
            SeatSwap::SourceDetached => Err(ReservationError::ConstraintViolation(format!(
                "seat {from} is no longer held by booking {bid}"
            ))),
            SeatSwap::TargetTaken => Err(ReservationError::SeatUnavailable { ssid: to }),
        }
    }

    /// Переводит все Pending-брони в Cancelled и возвращает число изменённых.
    /// Места не трогает: отмена значит "оплата больше не ожидается", а не
    /// "места свободны". Повторный вызов возвращает 0.
    pub async fn cancel_pending_bookings(&self) -> Result<u64> {
        let cancelled = self.store.cancel_pending_bookings().await?;
        info!("🎫 {} pending bookings cancelled", cancelled);
        Ok(cancelled)
    }

    /// Удаляет платёж и безусловно отменяет его бронь, даже уже оплаченную:
    /// снятие платежа всегда аннулирует бронь. Возвращает bid затронутой
    /// брони; повторный вызов по удалённому платежу — `NotFound`.
    pub async fn remove_payment(&self, pid: i64) -> Result<i64> {
        match self.store.delete_payment_and_cancel_booking(pid).await? {
            Some(bid) => {
                info!(pid, bid, "💳 payment removed, booking cancelled");
                Ok(bid)
            }
            None => Err(ReservationError::not_found("payment", pid)),
        }
    }

    /// Чистит отменённые брони: сначала освобождает их места, затем удаляет
    /// строки — после коммита ни одной висящей ссылки show_seats.bid.
    /// Повторный вызов возвращает 0.
    pub async fn clear_cancelled_bookings(&self) -> Result<u64> {
        let purged = self.store.purge_cancelled_bookings().await?;
        info!("🧹 {} cancelled bookings purged", purged);
        Ok(purged)
    }

    /// Снимает все сеансы даты в кинотеатре одной транзакцией: места
    /// освобождаются, брони принудительно отменяются независимо от статуса,
    /// Play и Show удаляются. Возвращает оба счётчика для отчёта вызывающему.
    pub async fn remove_shows_on_date(&self, date: NaiveDate, cid: i64) -> Result<ShowRemoval> {
        let removal = self.store.remove_shows_on_date(date, cid).await?;
        if removal.bookings_cancelled > 0 {
            warn!(
                %date,
                cid,
                cancelled = removal.bookings_cancelled,
                "bookings force-cancelled by show removal"
            );
        }
        info!("🧹 {} shows removed on {}", removal.shows_removed, date);
        Ok(removal)
    }
}
