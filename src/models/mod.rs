pub mod user;
pub mod movie;
pub mod showtime;
pub mod seat;
pub mod booking;

pub use user::{Role, User};
pub use movie::{Movie, MovieChanges, NewMovie};
pub use showtime::Showtime;
pub use seat::{SeatLabel, SeatPool};
pub use booking::{Booking, BookingStatus};
