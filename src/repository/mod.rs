pub mod bookings;
pub mod catalog;
pub mod reminders;
