//! # authgate-client
//!
//! Client SDK for the Authgate authentication API.
//!
//! Two layers:
//!
//! - [`AuthApi`]: the HTTP service. Owns a cookie-enabled `reqwest` client
//!   (refresh and session cookies ride along like in a browser) and an
//!   in-memory access-token cache. Concurrent 401s trigger exactly one
//!   refresh call; late callers reuse its result.
//! - [`AuthContext`]: the application-facing state container holding
//!   `{user, loading, error}`. Every action resolves to an
//!   [`ActionOutcome`] value so callers can render inline errors without
//!   handling panics or stray `Err`s.
//!
//! ```no_run
//! use authgate_client::{AuthApi, AuthContext};
//!
//! # async fn run() {
//! let api = AuthApi::new("http://localhost:4000").unwrap();
//! let mut auth = AuthContext::new(api);
//!
//! // Silent session restore; failure just means logged out.
//! auth.bootstrap().await;
//!
//! let outcome = auth.login("a@x.com", "Passw0rd1").await;
//! if !outcome.success {
//!     eprintln!("{}", outcome.message);
//! }
//! # }
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod types;

pub use api::AuthApi;
pub use context::{ActionOutcome, AuthContext};
pub use error::ClientError;
pub use types::*;
