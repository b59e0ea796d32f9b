//! Client library for the Pristine Primier real-estate backend.
//!
//! The backend speaks REST with session-cookie authentication and CSRF
//! protection, answers with inconsistently shaped envelopes, and has grown
//! more than one route for some operations. This crate is the resilient
//! data-access layer in front of all that: every call goes through one
//! [`api::ApiClient`] choke point, session state has one owner
//! ([`session::SessionManager`]), listing creation runs the explicit
//! two-phase create-then-upload protocol, and the listing wizard's
//! step validation is pure and testable.

pub mod api;
pub mod config;
pub mod inquiries;
pub mod media;
pub mod models;
pub mod properties;
pub mod session;
pub mod wizard;

pub use api::{ApiClient, ApiError};
pub use config::ApiConfig;
pub use session::{Session, SessionManager};
