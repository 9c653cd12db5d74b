mod common;

use std::collections::HashMap;

use futures::future::join_all;

use cinema_reservation::error::ReservationError;
use cinema_reservation::models::BookingStatus;
use cinema_reservation::store::ReservationStore;

use common::{booking_engine, datetime};

#[tokio::test]
async fn racing_claims_have_single_winner() {
    common::init_tracing();
    let (store, svc) = booking_engine();
    let at = datetime("2026-08-10 12:00:00");

    for bid in [100, 101] {
        svc.create_booking(bid, BookingStatus::Pending, at, 1, 5, "u@x.com")
            .await
            .unwrap();
    }

    let tasks: Vec<_> = [100i64, 101]
        .into_iter()
        .map(|bid| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.assign_seat(bid, 1).await })
        })
        .collect();

    let mut winners = 0;
    let mut losers = 0;
    for outcome in join_all(tasks).await {
        match outcome.unwrap() {
            Ok(()) => winners += 1,
            Err(ReservationError::SeatUnavailable { ssid: 1 }) => losers += 1,
            Err(other) => panic!("unexpected error under race: {other}"),
        }
    }
    assert_eq!((winners, losers), (1, 1));

    let seat = store.fetch_seat(1).await.unwrap().unwrap();
    assert!(matches!(seat.bid, Some(100) | Some(101)));
}

#[tokio::test]
async fn stressed_seats_end_with_exactly_one_owner_each() {
    let (store, svc) = booking_engine();
    let at = datetime("2026-08-10 12:00:00");

    let bids: Vec<i64> = (100..116).collect();
    for &bid in &bids {
        svc.create_booking(bid, BookingStatus::Pending, at, 3, 5, "u@x.com")
            .await
            .unwrap();
    }

    // Каждая бронь атакует каждое место сеанса 5 с ценой 1000.
    let mut tasks = Vec::new();
    for &bid in &bids {
        for ssid in 1..=3i64 {
            let svc = svc.clone();
            tasks.push(tokio::spawn(async move {
                (ssid, svc.assign_seat(bid, ssid).await)
            }));
        }
    }

    let mut wins_per_seat: HashMap<i64, u32> = HashMap::new();
    for outcome in join_all(tasks).await {
        let (ssid, result) = outcome.unwrap();
        match result {
            Ok(()) => *wins_per_seat.entry(ssid).or_insert(0) += 1,
            Err(ReservationError::SeatUnavailable { .. }) => {}
            Err(other) => panic!("unexpected error under race: {other}"),
        }
    }

    let mut total_held = 0;
    for ssid in 1..=3i64 {
        assert_eq!(wins_per_seat.get(&ssid), Some(&1));
        let owner = store.fetch_seat(ssid).await.unwrap().unwrap().bid;
        let owner = owner.expect("every contested seat must end up owned");
        assert!(bids.contains(&owner));
        total_held += 1;
    }
    let mut held_by_bookings = 0;
    for &bid in &bids {
        held_by_bookings += store.seats_held_by(bid).await.unwrap();
    }
    assert_eq!(held_by_bookings, total_held);
}

#[tokio::test]
async fn racing_reassigns_never_lose_a_seat() {
    let (store, svc) = booking_engine();
    let at = datetime("2026-08-10 12:00:00");

    svc.create_booking(100, BookingStatus::Pending, at, 1, 5, "u@x.com")
        .await
        .unwrap();
    svc.create_booking(101, BookingStatus::Pending, at, 1, 5, "v@x.com")
        .await
        .unwrap();
    svc.assign_seat(100, 1).await.unwrap();
    svc.assign_seat(101, 3).await.unwrap();

    // Обе брони метят на единственное свободное место 2.
    let tasks: Vec<_> = [(100i64, 1i64), (101, 3)]
        .into_iter()
        .map(|(bid, from)| {
            let svc = svc.clone();
            tokio::spawn(async move { (bid, from, svc.reassign_seat(bid, from, 2).await) })
        })
        .collect();

    let mut swapped = 0;
    for outcome in join_all(tasks).await {
        let (bid, from, result) = outcome.unwrap();
        match result {
            Ok(()) => {
                swapped += 1;
                assert_eq!(store.fetch_seat(2).await.unwrap().unwrap().bid, Some(bid));
            }
            // Проигравший видит либо сорванный CAS, либо уже занятую цель на
            // этапе подбора кандидатов; его исходное место остаётся за ним.
            Err(ReservationError::SeatUnavailable { ssid: 2 })
            | Err(ReservationError::ConstraintViolation(_)) => {
                assert_eq!(store.fetch_seat(from).await.unwrap().unwrap().bid, Some(bid));
            }
            Err(other) => panic!("unexpected error under race: {other}"),
        }
    }
    assert_eq!(swapped, 1);

    // Суммарное число мест за бронями не изменилось.
    assert_eq!(store.seats_held_by(100).await.unwrap(), 1);
    assert_eq!(store.seats_held_by(101).await.unwrap(), 1);
}
