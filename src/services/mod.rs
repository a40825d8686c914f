pub mod bookings;
pub mod mailer;
pub mod reminders;
pub mod scheduler;
