//! One-time code generation and hashing.

use rand::RngCore;

use crate::utils::errors::AppError;
use crate::utils::password::{hash_password, verify_password};

/// Generates a 6-digit one-time code from 4 bytes of CSPRNG output reduced
/// modulo 1,000,000 and zero-padded.
///
/// The modulo bias from `2^32 mod 10^6` is on the order of one part in ten
/// thousand and acceptable for a rate-limited, short-lived code.
pub fn generate_otp() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    let num = u32::from_be_bytes(bytes);
    format!("{:06}", num % 1_000_000)
}

/// Codes are stored bcrypt-hashed, like passwords.
pub fn hash_otp(otp: &str) -> Result<String, AppError> {
    hash_password(otp)
}

pub fn verify_otp_hash(otp: &str, hash: &str) -> Result<bool, AppError> {
    verify_password(otp, hash)
}
