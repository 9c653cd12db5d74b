use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub lname: String,
    pub fname: String,
    pub phone: Option<String>,
    pub pwd: String,
}
