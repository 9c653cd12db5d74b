use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Booking, Payment, Show, ShowSeat, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Исход транзакционного обмена мест брони.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatSwap {
    /// Старое место освобождено, новое захвачено, транзакция зафиксирована.
    Swapped,
    /// Исходное место уже не принадлежит брони; откат.
    SourceDetached,
    /// Новое место перехватили между проверкой и захватом; откат.
    TargetTaken,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowRemoval {
    pub shows_removed: u64,
    pub bookings_cancelled: u64,
}

/// Контракт хранилища, который требуется движку бронирования.
///
/// Проверки существования — булевы предикаты, не подсчёт строк. Каждый
/// составной метод (swap/purge/remove) выполняется в одной all-or-nothing
/// транзакции хранилища.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    // --- существование ---
    async fn user_exists(&self, email: &str) -> Result<bool>;
    async fn show_exists(&self, sid: i64) -> Result<bool>;
    async fn booking_exists(&self, bid: i64) -> Result<bool>;
    async fn theater_exists(&self, tid: i64) -> Result<bool>;
    async fn movie_exists(&self, mvid: i64) -> Result<bool>;

    // --- чтение ---
    async fn fetch_booking(&self, bid: i64) -> Result<Option<Booking>>;
    async fn fetch_seat(&self, ssid: i64) -> Result<Option<ShowSeat>>;
    async fn fetch_payment(&self, pid: i64) -> Result<Option<Payment>>;
    async fn seats_held_by(&self, bid: i64) -> Result<i64>;

    // --- чтение для аллокатора ---
    async fn theaters_for_show(&self, sid: i64) -> Result<Vec<i64>>;
    async fn shows_in_theaters(&self, tids: &[i64]) -> Result<Vec<i64>>;
    /// Свободные места указанной цены, отсортированные по ssid.
    async fn free_seats_with_price(&self, price: i64) -> Result<Vec<ShowSeat>>;

    // --- вставки (дубликат ключа => DuplicateKey) ---
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;
    async fn insert_show(&self, show: &Show) -> Result<()>;
    async fn insert_play(&self, sid: i64, tid: i64) -> Result<()>;
    /// Создаёт по одному ShowSeat на каждое физическое место зала.
    async fn create_show_seats(&self, sid: i64, tid: i64, price: i64) -> Result<u64>;

    // --- CAS-захват ---
    /// "set bid = $booking where ssid = $seat and bid is null"; true, если
    /// изменилась ровно одна строка.
    async fn claim_seat_if_free(&self, ssid: i64, bid: i64) -> Result<bool>;

    // --- транзакционные составные операции ---
    async fn swap_seat(&self, bid: i64, from: i64, to: i64) -> Result<SeatSwap>;
    async fn cancel_pending_bookings(&self) -> Result<u64>;
    /// Возвращает bid затронутой брони; None, если платежа нет.
    async fn delete_payment_and_cancel_booking(&self, pid: i64) -> Result<Option<i64>>;
    async fn purge_cancelled_bookings(&self) -> Result<u64>;
    async fn remove_shows_on_date(&self, date: NaiveDate, cid: i64) -> Result<ShowRemoval>;
}
