pub mod config;
pub mod credential_store;
pub mod error;
pub mod google_calendar;
pub mod source;
pub mod ticktick;
