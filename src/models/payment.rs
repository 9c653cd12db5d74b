use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub pid: i64,
    pub bid: i64,
    pub pmethod: Option<String>,
    pub pdatetime: NaiveDateTime,
    pub amount: i64,
}
