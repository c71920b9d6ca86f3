pub mod admin;
pub mod auth;
pub mod booking;
pub mod notification;
pub mod seat_inventory;
