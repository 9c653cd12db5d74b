use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::{ReservationError, Result};
use crate::models::{Booking, BookingStatus, CinemaSeat, Movie, Payment, Show, ShowSeat, Theater, User};
use crate::models::Cinema;

use super::{ReservationStore, SeatSwap, ShowRemoval};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    movies: HashMap<i64, Movie>,
    cinemas: HashMap<i64, Cinema>,
    theaters: HashMap<i64, Theater>,
    cinema_seats: HashMap<i64, CinemaSeat>,
    shows: HashMap<i64, Show>,
    plays: HashSet<(i64, i64)>,
    // BTreeMap даёт детерминированный порядок по ssid.
    show_seats: BTreeMap<i64, ShowSeat>,
    bookings: HashMap<i64, Booking>,
    payments: HashMap<i64, Payment>,
}

/// Встроенное хранилище поверх одного мьютекса. Каждый метод контракта
/// проверяет все предусловия до первой мутации, удерживая блокировку, поэтому
/// вызов атомарен и у CAS-гонки ровно один победитель.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Сидирование каталога для тестов и встраиваемых потребителей. Движок
    // каталог не мутирует, поэтому здесь обычные upsert-хелперы.

    pub fn seed_user(&self, user: User) {
        self.tables.lock().unwrap().users.insert(user.email.clone(), user);
    }

    pub fn seed_movie(&self, movie: Movie) {
        self.tables.lock().unwrap().movies.insert(movie.mvid, movie);
    }

    pub fn seed_cinema(&self, cinema: Cinema) {
        self.tables.lock().unwrap().cinemas.insert(cinema.cid, cinema);
    }

    pub fn seed_theater(&self, theater: Theater) {
        self.tables.lock().unwrap().theaters.insert(theater.tid, theater);
    }

    pub fn seed_cinema_seat(&self, seat: CinemaSeat) {
        self.tables.lock().unwrap().cinema_seats.insert(seat.csid, seat);
    }

    pub fn seed_show(&self, show: Show) {
        self.tables.lock().unwrap().shows.insert(show.sid, show);
    }

    pub fn seed_play(&self, sid: i64, tid: i64) {
        self.tables.lock().unwrap().plays.insert((sid, tid));
    }

    pub fn seed_show_seat(&self, seat: ShowSeat) {
        self.tables.lock().unwrap().show_seats.insert(seat.ssid, seat);
    }

    pub fn seed_payment(&self, payment: Payment) {
        self.tables.lock().unwrap().payments.insert(payment.pid, payment);
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn user_exists(&self, email: &str) -> Result<bool> {
        Ok(self.tables.lock().unwrap().users.contains_key(email))
    }

    async fn show_exists(&self, sid: i64) -> Result<bool> {
        Ok(self.tables.lock().unwrap().shows.contains_key(&sid))
    }

    async fn booking_exists(&self, bid: i64) -> Result<bool> {
        Ok(self.tables.lock().unwrap().bookings.contains_key(&bid))
    }

    async fn theater_exists(&self, tid: i64) -> Result<bool> {
        Ok(self.tables.lock().unwrap().theaters.contains_key(&tid))
    }

    async fn movie_exists(&self, mvid: i64) -> Result<bool> {
        Ok(self.tables.lock().unwrap().movies.contains_key(&mvid))
    }

    async fn fetch_booking(&self, bid: i64) -> Result<Option<Booking>> {
        Ok(self.tables.lock().unwrap().bookings.get(&bid).cloned())
    }

    async fn fetch_seat(&self, ssid: i64) -> Result<Option<ShowSeat>> {
        Ok(self.tables.lock().unwrap().show_seats.get(&ssid).cloned())
    }

    async fn fetch_payment(&self, pid: i64) -> Result<Option<Payment>> {
        Ok(self.tables.lock().unwrap().payments.get(&pid).cloned())
    }

    async fn seats_held_by(&self, bid: i64) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .show_seats
            .values()
            .filter(|s| s.bid == Some(bid))
            .count() as i64)
    }

    async fn theaters_for_show(&self, sid: i64) -> Result<Vec<i64>> {
        let tables = self.tables.lock().unwrap();
        let mut tids: Vec<i64> = tables
            .plays
            .iter()
            .filter(|(s, _)| *s == sid)
            .map(|(_, t)| *t)
            .collect();
        tids.sort_unstable();
        Ok(tids)
    }

    async fn shows_in_theaters(&self, tids: &[i64]) -> Result<Vec<i64>> {
        let tables = self.tables.lock().unwrap();
        let mut sids: Vec<i64> = tables
            .plays
            .iter()
            .filter(|(_, t)| tids.contains(t))
            .map(|(s, _)| *s)
            .collect();
        sids.sort_unstable();
        sids.dedup();
        Ok(sids)
    }

    async fn free_seats_with_price(&self, price: i64) -> Result<Vec<ShowSeat>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .show_seats
            .values()
            .filter(|s| s.bid.is_none() && s.price == price)
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.contains_key(&user.email) {
            return Err(ReservationError::duplicate("email", &user.email));
        }
        tables.users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.bookings.contains_key(&booking.bid) {
            return Err(ReservationError::duplicate("bid", booking.bid));
        }
        tables.bookings.insert(booking.bid, booking.clone());
        Ok(())
    }

    async fn insert_show(&self, show: &Show) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.shows.contains_key(&show.sid) {
            return Err(ReservationError::duplicate("sid", show.sid));
        }
        tables.shows.insert(show.sid, show.clone());
        Ok(())
    }

    async fn insert_play(&self, sid: i64, tid: i64) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.plays.insert((sid, tid)) {
            return Err(ReservationError::duplicate("(sid, tid)", format!("({sid}, {tid})")));
        }
        Ok(())
    }

    async fn create_show_seats(&self, sid: i64, tid: i64, price: i64) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let mut next_ssid = tables.show_seats.keys().max().copied().unwrap_or(0) + 1;
        let csids: Vec<i64> = tables
            .cinema_seats
            .values()
            .filter(|cs| cs.tid == tid)
            .map(|cs| cs.csid)
            .collect();
        let created = csids.len() as u64;
        for csid in csids {
            tables.show_seats.insert(
                next_ssid,
                ShowSeat {
                    ssid: next_ssid,
                    sid,
                    csid,
                    price,
                    bid: None,
                },
            );
            next_ssid += 1;
        }
        Ok(created)
    }

    async fn claim_seat_if_free(&self, ssid: i64, bid: i64) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.show_seats.get_mut(&ssid) {
            Some(seat) if seat.bid.is_none() => {
                seat.bid = Some(bid);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn swap_seat(&self, bid: i64, from: i64, to: i64) -> Result<SeatSwap> {
        let mut tables = self.tables.lock().unwrap();

        // Все проверки до первой мутации: неудача не оставляет следов.
        match tables.show_seats.get(&from) {
            Some(seat) if seat.bid == Some(bid) => {}
            _ => return Ok(SeatSwap::SourceDetached),
        }
        match tables.show_seats.get(&to) {
            Some(seat) if seat.bid.is_none() => {}
            _ => return Ok(SeatSwap::TargetTaken),
        }

        tables.show_seats.get_mut(&from).unwrap().bid = None;
        tables.show_seats.get_mut(&to).unwrap().bid = Some(bid);
        Ok(SeatSwap::Swapped)
    }

    async fn cancel_pending_bookings(&self) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let mut cancelled = 0;
        for booking in tables.bookings.values_mut() {
            if booking.status == BookingStatus::Pending {
                booking.status = BookingStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn delete_payment_and_cancel_booking(&self, pid: i64) -> Result<Option<i64>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(payment) = tables.payments.remove(&pid) else {
            return Ok(None);
        };
        if let Some(booking) = tables.bookings.get_mut(&payment.bid) {
            booking.status = BookingStatus::Cancelled;
        }
        Ok(Some(payment.bid))
    }

    async fn purge_cancelled_bookings(&self) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let doomed: HashSet<i64> = tables
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Cancelled)
            .map(|b| b.bid)
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        for seat in tables.show_seats.values_mut() {
            if seat.bid.is_some_and(|bid| doomed.contains(&bid)) {
                seat.bid = None;
            }
        }
        // Платёж живёт только вместе со своей бронью.
        tables.payments.retain(|_, p| !doomed.contains(&p.bid));
        tables.bookings.retain(|bid, _| !doomed.contains(bid));
        Ok(doomed.len() as u64)
    }

    async fn remove_shows_on_date(&self, date: NaiveDate, cid: i64) -> Result<ShowRemoval> {
        let mut tables = self.tables.lock().unwrap();

        let theater_ids: HashSet<i64> = tables
            .theaters
            .values()
            .filter(|t| t.cid == cid)
            .map(|t| t.tid)
            .collect();
        let doomed: HashSet<i64> = tables
            .shows
            .values()
            .filter(|s| s.sdate == date)
            .filter(|s| {
                tables
                    .plays
                    .iter()
                    .any(|(sid, tid)| *sid == s.sid && theater_ids.contains(tid))
            })
            .map(|s| s.sid)
            .collect();
        if doomed.is_empty() {
            return Ok(ShowRemoval::default());
        }

        let mut cancelled = 0;
        for booking in tables.bookings.values_mut() {
            if booking.sid.is_some_and(|sid| doomed.contains(&sid)) {
                booking.status = BookingStatus::Cancelled;
                booking.sid = None;
                cancelled += 1;
            }
        }
        // Места удаляемого сеанса уходят вместе с ним.
        tables.show_seats.retain(|_, seat| !doomed.contains(&seat.sid));
        tables.plays.retain(|(sid, _)| !doomed.contains(sid));
        tables.shows.retain(|sid, _| !doomed.contains(sid));

        Ok(ShowRemoval {
            shows_removed: doomed.len() as u64,
            bookings_cancelled: cancelled,
        })
    }
}
