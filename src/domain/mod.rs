pub mod layout;
pub mod models;
pub mod palette;
pub mod week;
