//! JSON bodies exchanged with the Elimu Space auth and account endpoints.
//!
//! Field names are the backend's own, so a struct here can be handed straight
//! to serde in either direction. Session rules (what gets stored, when to
//! refresh) belong to `elimu-session`; nothing in this crate does I/O.

pub mod account;
pub mod auth;
pub mod user;

pub use account::*;
pub use auth::*;
pub use user::*;
