pub mod commands;
pub mod config;
pub mod constructor;
pub mod database;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod media;
pub mod quiz;
pub mod runner;
pub mod state;
pub mod validation;
pub mod view;

pub use error::{Error, Result};
