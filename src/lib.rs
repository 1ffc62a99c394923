//! View-model for the shortlink service
//!
//! A typed, asynchronous controller that keeps the view state of the
//! shortlink pages in sync with the backend API:
//! - `context` - which page, which user, which public origin
//! - `controller` - validation, requests, response merging, refetch dispatch
//! - `api` - the backend as a trait, plus its HTTP implementation

pub mod api;
pub mod command;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod model;
pub mod prompt;
pub mod state;
pub mod validate;
