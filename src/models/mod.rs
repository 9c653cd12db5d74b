pub mod booking;
pub mod catalog;
pub mod payment;
pub mod seat;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use catalog::{Cinema, CinemaSeat, Movie, Show, Theater};
pub use payment::Payment;
pub use seat::ShowSeat;
pub use user::User;
