#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

use cinema_reservation::models::{Cinema, CinemaSeat, Movie, Show, ShowSeat, Theater, User};
use cinema_reservation::services::BookingService;
use cinema_reservation::store::MemoryStore;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn user(email: &str) -> User {
    User {
        email: email.to_string(),
        lname: "Doe".to_string(),
        fname: "Jane".to_string(),
        phone: Some("555-0100".to_string()),
        pwd: "hash".to_string(),
    }
}

pub fn show(sid: i64) -> Show {
    Show {
        sid,
        mvid: 1,
        sdate: date("2026-08-20"),
        sttime: "18:00:00".parse().unwrap(),
        edtime: "21:00:00".parse().unwrap(),
    }
}

pub fn show_seat(ssid: i64, sid: i64, price: i64) -> ShowSeat {
    ShowSeat {
        ssid,
        sid,
        csid: ssid,
        price,
        bid: None,
    }
}

/// Каталог по умолчанию: кинотеатр 1 с залами 1 и 2, фильм 1, сеанс 5 в зале
/// 1 и сеанс 6 в зале 2 на одну дату. Места сеанса 5: ssid 1..3 по 1000,
/// ssid 4 за 1200; сеанса 6: ssid 5..6 по 1000.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.seed_user(user("u@x.com"));
    store.seed_user(user("v@x.com"));
    store.seed_movie(Movie {
        mvid: 1,
        title: "Interstellar".to_string(),
        rdate: date("2014-11-07"),
        country: None,
        description: None,
        duration: Some(169),
        lang: None,
        genre: None,
    });
    store.seed_cinema(Cinema {
        cid: 1,
        cname: "Central".to_string(),
        tnum: 2,
    });
    store.seed_theater(Theater {
        tid: 1,
        tname: "Red hall".to_string(),
        tseats: 4,
        cid: 1,
    });
    store.seed_theater(Theater {
        tid: 2,
        tname: "Blue hall".to_string(),
        tseats: 2,
        cid: 1,
    });
    for csid in 1..=4 {
        store.seed_cinema_seat(CinemaSeat {
            csid,
            tid: 1,
            sno: csid as i32,
            stype: None,
        });
    }
    for csid in 5..=6 {
        store.seed_cinema_seat(CinemaSeat {
            csid,
            tid: 2,
            sno: (csid - 4) as i32,
            stype: None,
        });
    }
    store.seed_show(show(5));
    store.seed_show(show(6));
    store.seed_play(5, 1);
    store.seed_play(6, 2);
    for ssid in 1..=3 {
        store.seed_show_seat(show_seat(ssid, 5, 1000));
    }
    store.seed_show_seat(show_seat(4, 5, 1200));
    for ssid in 5..=6 {
        store.seed_show_seat(show_seat(ssid, 6, 1000));
    }

    store
}

pub fn booking_engine() -> (MemoryStore, BookingService<MemoryStore>) {
    let store = seeded_store();
    let service = BookingService::new(Arc::new(store.clone()));
    (store, service)
}
