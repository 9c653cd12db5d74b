use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Место конкретного сеанса. `bid = None` — место свободно.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShowSeat {
    pub ssid: i64,
    pub sid: i64,
    pub csid: i64,
    pub price: i64,
    pub bid: Option<i64>,
}

impl ShowSeat {
    pub fn is_free(&self) -> bool {
        self.bid.is_none()
    }
}
