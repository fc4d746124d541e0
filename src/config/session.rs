use std::env;

/// Which session mechanism the server issues at login.
///
/// The two schemes are mutually exclusive: `Rotating` backs every session
/// with a database refresh-token record that is rotated on use, while
/// `Stateless` relies purely on a signed cookie claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Opaque refresh token in the `refreshToken` cookie, rotated on use.
    Rotating,
    /// Signed `auth-session` cookie, no server-side storage.
    Stateless,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub mode: SessionMode,
    pub secret: String,
    /// Session claim lifetime in seconds.
    pub max_age: i64,
    /// Gates the `Secure` attribute on cookies.
    pub production: bool,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let mode = match env::var("SESSION_MODE").as_deref() {
            Ok("stateless") => SessionMode::Stateless,
            _ => SessionMode::Rotating,
        };

        // The session signer falls back to the JWT secret so a single-secret
        // deployment keeps working.
        let secret = env::var("SESSION_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());

        Self {
            mode,
            secret,
            max_age: env::var("SESSION_MAX_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604_800), // 7 days
            production: env::var("ENVIRONMENT")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}
