//! Session Token Generation
//! Mission: Mint opaque, unguessable bearer tokens

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};

/// Random bytes per token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Generate a new session token: hex of `TOKEN_BYTES` bytes from the OS CSPRNG
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("OS random source unavailable")?;
    Ok(hex::encode(bytes))
}
