use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::warn;

use crate::error::{ReservationError, Result};
use crate::models::{Booking, BookingStatus, Payment, Show, ShowSeat, User};

use super::{ReservationStore, SeatSwap, ShowRemoval};

/// Продакшен-хранилище поверх PostgreSQL. Только параметризованные запросы;
/// составные операции выполняются под `pool.begin()` с откатом на каждом
/// неуспешном пути.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_err(e: sqlx::Error, field: &'static str, value: impl ToString) -> ReservationError {
    if e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        ReservationError::duplicate(field, value)
    } else {
        ReservationError::Store(e)
    }
}

fn parse_status(raw: &str) -> Result<BookingStatus> {
    BookingStatus::from_str(raw)
        .map_err(|e| ReservationError::Store(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn user_exists(&self, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn show_exists(&self, sid: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shows WHERE sid = $1)")
                .bind(sid)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn booking_exists(&self, bid: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE bid = $1)")
                .bind(bid)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn theater_exists(&self, tid: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM theaters WHERE tid = $1)")
                .bind(tid)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn movie_exists(&self, mvid: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movies WHERE mvid = $1)")
                .bind(mvid)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn fetch_booking(&self, bid: i64) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, (i64, String, NaiveDateTime, i32, Option<i64>, String)>(
            "SELECT bid, status, bdatetime, seats, sid, email FROM bookings WHERE bid = $1",
        )
        .bind(bid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(bid, status, bdatetime, seats, sid, email)| {
            Ok(Booking {
                bid,
                status: parse_status(&status)?,
                bdatetime,
                seats,
                sid,
                email,
            })
        })
        .transpose()
    }

    async fn fetch_seat(&self, ssid: i64) -> Result<Option<ShowSeat>> {
        let seat = sqlx::query_as::<_, ShowSeat>(
            "SELECT ssid, sid, csid, price, bid FROM show_seats WHERE ssid = $1",
        )
        .bind(ssid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(seat)
    }

    async fn fetch_payment(&self, pid: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT pid, bid, pmethod, pdatetime, amount FROM payments WHERE pid = $1",
        )
        .bind(pid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    async fn seats_held_by(&self, bid: i64) -> Result<i64> {
        let held =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM show_seats WHERE bid = $1")
                .bind(bid)
                .fetch_one(&self.pool)
                .await?;
        Ok(held)
    }

    async fn theaters_for_show(&self, sid: i64) -> Result<Vec<i64>> {
        let tids =
            sqlx::query_scalar::<_, i64>("SELECT tid FROM plays WHERE sid = $1 ORDER BY tid")
                .bind(sid)
                .fetch_all(&self.pool)
                .await?;
        Ok(tids)
    }

    async fn shows_in_theaters(&self, tids: &[i64]) -> Result<Vec<i64>> {
        if tids.is_empty() {
            return Ok(Vec::new());
        }
        let sids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT sid FROM plays WHERE tid = ANY($1)",
        )
        .bind(tids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(sids)
    }

    async fn free_seats_with_price(&self, price: i64) -> Result<Vec<ShowSeat>> {
        let seats = sqlx::query_as::<_, ShowSeat>(
            "SELECT ssid, sid, csid, price, bid FROM show_seats \
             WHERE bid IS NULL AND price = $1 ORDER BY ssid",
        )
        .bind(price)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (email, lname, fname, phone, pwd) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&user.email)
        .bind(&user.lname)
        .bind(&user.fname)
        .bind(&user.phone)
        .bind(&user.pwd)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "email", &user.email))?;
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            "INSERT INTO bookings (bid, status, bdatetime, seats, sid, email) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(booking.bid)
        .bind(booking.status.as_str())
        .bind(booking.bdatetime)
        .bind(booking.seats)
        .bind(booking.sid)
        .bind(&booking.email)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "bid", booking.bid))?;
        Ok(())
    }

    async fn insert_show(&self, show: &Show) -> Result<()> {
        sqlx::query(
            "INSERT INTO shows (sid, mvid, sdate, sttime, edtime) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(show.sid)
        .bind(show.mvid)
        .bind(show.sdate)
        .bind(show.sttime)
        .bind(show.edtime)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "sid", show.sid))?;
        Ok(())
    }

    async fn insert_play(&self, sid: i64, tid: i64) -> Result<()> {
        sqlx::query("INSERT INTO plays (sid, tid) VALUES ($1, $2)")
            .bind(sid)
            .bind(tid)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_err(e, "(sid, tid)", format!("({sid}, {tid})")))?;
        Ok(())
    }

    async fn create_show_seats(&self, sid: i64, tid: i64, price: i64) -> Result<u64> {
        let created = sqlx::query(
            "INSERT INTO show_seats (sid, csid, price) \
             SELECT $1, cs.csid, $3 FROM cinema_seats cs WHERE cs.tid = $2",
        )
        .bind(sid)
        .bind(tid)
        .bind(price)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(created)
    }

    async fn claim_seat_if_free(&self, ssid: i64, bid: i64) -> Result<bool> {
        // Атомарный conditional update, не read-then-write.
        let claimed = sqlx::query(
            "UPDATE show_seats SET bid = $1 WHERE ssid = $2 AND bid IS NULL",
        )
        .bind(bid)
        .bind(ssid)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(claimed == 1)
    }

    async fn swap_seat(&self, bid: i64, from: i64, to: i64) -> Result<SeatSwap> {
        let mut tx = self.pool.begin().await?;

        // 1) Освобождаем старое место, только если оно всё ещё за бронью.
        let released = sqlx::query(
            "UPDATE show_seats SET bid = NULL WHERE ssid = $1 AND bid = $2",
        )
        .bind(from)
        .bind(bid)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if released == 0 {
            tx.rollback().await?;
            return Ok(SeatSwap::SourceDetached);
        }

        // 2) CAS-захват нового; проигрыш гонки откатывает и освобождение.
        let claimed = sqlx::query(
            "UPDATE show_seats SET bid = $1 WHERE ssid = $2 AND bid IS NULL",
        )
        .bind(bid)
        .bind(to)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            warn!(bid, from, to, "seat swap lost the race for the target seat");
            return Ok(SeatSwap::TargetTaken);
        }

        tx.commit().await?;
        Ok(SeatSwap::Swapped)
    }

    async fn cancel_pending_bookings(&self) -> Result<u64> {
        let cancelled = sqlx::query("UPDATE bookings SET status = $1 WHERE status = $2")
            .bind(BookingStatus::Cancelled.as_str())
            .bind(BookingStatus::Pending.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(cancelled)
    }

    async fn delete_payment_and_cancel_booking(&self, pid: i64) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let bid: Option<i64> =
            sqlx::query_scalar("SELECT bid FROM payments WHERE pid = $1 FOR UPDATE")
                .bind(pid)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(bid) = bid else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Снятие платежа безусловно отменяет бронь, даже уже оплаченную.
        sqlx::query("UPDATE bookings SET status = $1 WHERE bid = $2")
            .bind(BookingStatus::Cancelled.as_str())
            .bind(bid)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM payments WHERE pid = $1")
            .bind(pid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(bid))
    }

    async fn purge_cancelled_bookings(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        // Сначала освобождаем места, затем удаляем брони: ни одной висящей
        // ссылки show_seats.bid после коммита.
        sqlx::query(
            "UPDATE show_seats SET bid = NULL \
             WHERE bid IN (SELECT bid FROM bookings WHERE status = $1)",
        )
        .bind(BookingStatus::Cancelled.as_str())
        .execute(&mut *tx)
        .await?;

        let purged = sqlx::query("DELETE FROM bookings WHERE status = $1")
            .bind(BookingStatus::Cancelled.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(purged)
    }

    async fn remove_shows_on_date(&self, date: NaiveDate, cid: i64) -> Result<ShowRemoval> {
        let mut tx = self.pool.begin().await?;

        let sids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT s.sid FROM shows s \
             JOIN plays p ON p.sid = s.sid \
             JOIN theaters t ON t.tid = p.tid \
             WHERE s.sdate = $1 AND t.cid = $2",
        )
        .bind(date)
        .bind(cid)
        .fetch_all(&mut *tx)
        .await?;

        if sids.is_empty() {
            tx.rollback().await?;
            return Ok(ShowRemoval::default());
        }

        sqlx::query("UPDATE show_seats SET bid = NULL WHERE sid = ANY($1)")
            .bind(sids.clone())
            .execute(&mut *tx)
            .await?;

        let cancelled = sqlx::query("UPDATE bookings SET status = $1 WHERE sid = ANY($2)")
            .bind(BookingStatus::Cancelled.as_str())
            .bind(sids.clone())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM plays WHERE sid = ANY($1)")
            .bind(sids.clone())
            .execute(&mut *tx)
            .await?;

        // Каскад убирает show_seats сеанса; bookings.sid становится NULL.
        let removed = sqlx::query("DELETE FROM shows WHERE sid = ANY($1)")
            .bind(sids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(ShowRemoval {
            shows_removed: removed,
            bookings_cancelled: cancelled,
        })
    }
}
