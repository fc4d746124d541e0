pub mod auth;
pub mod otp;
pub mod password;
pub mod users;

pub use self::users::model::User;
