pub mod auth;
pub mod jobs;
pub mod settings;
pub mod uploads;
