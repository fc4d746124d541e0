//! Email verification codes.
//!
//! Internal component used by the users module; has no routes of its own.

pub mod model;
pub mod service;
