use std::sync::Arc;
use tracing::info;

use crate::error::{ReservationError, Result};
use crate::models::{Show, User};
use crate::store::ReservationStore;

/// Регистрация пользователей и постановка сеансов. Чистые вставки с
/// проверками ссылок; кросс-сущностных инвариантов у каталога нет.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S: ReservationStore> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register_user(&self, user: &User) -> Result<()> {
        if self.store.user_exists(&user.email).await? {
            return Err(ReservationError::duplicate("email", &user.email));
        }
        self.store.insert_user(user).await?;
        info!(email = %user.email, "user registered");
        Ok(())
    }

    /// Ставит сеанс в зал: Show, его Play и по одному ShowSeat на каждое
    /// физическое место зала по заданной цене. Возвращает число созданных
    /// мест.
    pub async fn schedule_show(&self, show: &Show, tid: i64, seat_price: i64) -> Result<u64> {
        if !self.store.movie_exists(show.mvid).await? {
            return Err(ReservationError::not_found("movie", show.mvid));
        }
        if !self.store.theater_exists(tid).await? {
            return Err(ReservationError::not_found("theater", tid));
        }
        if self.store.show_exists(show.sid).await? {
            return Err(ReservationError::duplicate("sid", show.sid));
        }

        self.store.insert_show(show).await?;
        self.store.insert_play(show.sid, tid).await?;
        let seats = self
            .store
            .create_show_seats(show.sid, tid, seat_price)
            .await?;
        info!(sid = show.sid, tid, seats, "show scheduled");
        Ok(seats)
    }
}
