// src/lib.rs

//! Student Portal Client Library
//!
//! Logs into a WebForms student portal and extracts structured data from its
//! pages. Start with [`services::Portal`].

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, Result};
pub use services::Portal;
