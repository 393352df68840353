pub mod application;
pub mod cache;
pub mod commands;
pub mod db;
pub mod error;
pub mod rpm;
pub mod runtime;
