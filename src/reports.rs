use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::Show;

/// Read-only отчёты поверх пула. Ядро не трогают: ни одна из выборок ничего
/// не мутирует.
#[derive(Clone)]
pub struct Reports {
    pool: PgPool,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TheaterRow {
    pub tid: i64,
    pub tname: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct PendingUserRow {
    pub fname: String,
    pub lname: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ScheduleRow {
    pub title: String,
    pub duration: Option<i32>,
    pub sdate: NaiveDate,
    pub sttime: NaiveTime,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct UserBookingRow {
    pub title: String,
    pub sdate: NaiveDate,
    pub sttime: NaiveTime,
    pub tname: String,
    pub sno: i32,
}

impl Reports {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Залы кинотеатра, где идёт данный сеанс.
    pub async fn theaters_playing_show(
        &self,
        cid: i64,
        sid: i64,
    ) -> Result<Vec<TheaterRow>, sqlx::Error> {
        sqlx::query_as::<_, TheaterRow>(
            r#"
            SELECT t.tid, t.tname
            FROM theaters t
            JOIN plays p ON p.tid = t.tid
            WHERE t.cid = $1 AND p.sid = $2
            ORDER BY t.tid
            "#,
        )
        .bind(cid)
        .bind(sid)
        .fetch_all(&self.pool)
        .await
    }

    /// Сеансы, начинающиеся в заданные дату и время.
    pub async fn shows_starting_at(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Vec<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(
            r#"
            SELECT sid, mvid, sdate, sttime, edtime
            FROM shows
            WHERE sdate = $1 AND sttime = $2
            ORDER BY sid
            "#,
        )
        .bind(date)
        .bind(time)
        .fetch_all(&self.pool)
        .await
    }

    /// Названия фильмов со словом "love", вышедших после 2010 года.
    pub async fn love_titles_after_2010(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT title
            FROM movies
            WHERE title ILIKE '%love%' AND rdate >= '2011-01-01'
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Имя, фамилия и email пользователей с хотя бы одной Pending-бронью.
    pub async fn users_with_pending_booking(&self) -> Result<Vec<PendingUserRow>, sqlx::Error> {
        sqlx::query_as::<_, PendingUserRow>(
            r#"
            SELECT DISTINCT u.fname, u.lname, u.email
            FROM users u
            JOIN bookings b ON b.email = u.email
            WHERE b.status = 'Pending'
            ORDER BY u.email
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Название, длительность, дата и время сеансов фильма в кинотеатре за
    /// диапазон дат.
    pub async fn movie_schedule_at_cinema(
        &self,
        mvid: i64,
        cid: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleRow>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT m.title, m.duration, s.sdate, s.sttime
            FROM shows s
            JOIN movies m ON m.mvid = s.mvid
            JOIN plays p ON p.sid = s.sid
            JOIN theaters t ON t.tid = p.tid
            WHERE s.mvid = $1 AND t.cid = $2 AND s.sdate BETWEEN $3 AND $4
            ORDER BY s.sdate, s.sttime
            "#,
        )
        .bind(mvid)
        .bind(cid)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
    }

    /// Фильм, дата и начало сеанса, зал и номер кресла по всем броням
    /// пользователя.
    pub async fn bookings_for_user(
        &self,
        email: &str,
    ) -> Result<Vec<UserBookingRow>, sqlx::Error> {
        sqlx::query_as::<_, UserBookingRow>(
            r#"
            SELECT m.title, s.sdate, s.sttime, t.tname, cs.sno
            FROM bookings b
            JOIN show_seats ss ON ss.bid = b.bid
            JOIN shows s ON s.sid = ss.sid
            JOIN movies m ON m.mvid = s.mvid
            JOIN cinema_seats cs ON cs.csid = ss.csid
            JOIN theaters t ON t.tid = cs.tid
            WHERE b.email = $1
            ORDER BY s.sdate, s.sttime, cs.sno
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
    }
}
