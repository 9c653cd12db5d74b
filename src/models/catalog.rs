use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub mvid: i64,
    pub title: String,
    pub rdate: NaiveDate,
    pub country: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub lang: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Cinema {
    pub cid: i64,
    pub cname: String,
    pub tnum: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Theater {
    pub tid: i64,
    pub tname: String,
    pub tseats: i32,
    pub cid: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CinemaSeat {
    pub csid: i64,
    pub tid: i64,
    pub sno: i32,
    pub stype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub sid: i64,
    pub mvid: i64,
    pub sdate: NaiveDate,
    pub sttime: NaiveTime,
    pub edtime: NaiveTime,
}
