pub mod auth;
pub mod bridge;
pub mod files;
pub mod health;
pub mod images;
pub mod questions;
