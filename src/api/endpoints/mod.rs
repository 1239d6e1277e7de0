pub mod auth;
pub mod availability;
pub mod bookings;
pub mod plans;
pub mod subscriptions;
