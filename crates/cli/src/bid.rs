//! Bid preparation: salts and commitment hashes.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use sealbid_types::{compute_bid_commitment, Salt, SealedHash};

/// Errors that can occur during bid preparation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Invalid salt hex: {0}")]
    InvalidSaltHex(String),

    #[error("Salt must be exactly 32 bytes")]
    WrongSaltLength,

    #[error("Salt must be non-zero")]
    ZeroSalt,
}

/// A prepared bid ready for submission.
///
/// The `(amount, salt)` pair is the reveal opening; keep it until the
/// reveal window. The engine only ever sees the hash again at reveal time.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    pub auction_id: u64,
    pub amount: u64,
    /// Keep secret until reveal
    pub salt: Salt,
    /// What the engine will record at commit time
    pub sealed_hash: SealedHash,
}

/// Prepare a bid with a freshly generated random salt.
pub fn prepare_bid<R: RngCore + CryptoRng>(
    auction_id: u64,
    amount: u64,
    rng: &mut R,
) -> PreparedBid {
    let mut salt = Salt([0u8; 32]);
    // A zero salt is rejected by the engine; astronomically unlikely, but
    // loop rather than hand one in.
    while salt.is_zero() {
        rng.fill_bytes(&mut salt.0);
    }

    PreparedBid {
        auction_id,
        amount,
        salt,
        sealed_hash: compute_bid_commitment(auction_id, amount, &salt),
    }
}

/// Prepare a bid with a caller-supplied salt.
pub fn prepare_bid_with_salt(
    auction_id: u64,
    amount: u64,
    salt: Salt,
) -> Result<PreparedBid, BidError> {
    if salt.is_zero() {
        return Err(BidError::ZeroSalt);
    }
    Ok(PreparedBid {
        auction_id,
        amount,
        salt,
        sealed_hash: compute_bid_commitment(auction_id, amount, &salt),
    })
}

/// Parse a hex-encoded 32-byte salt.
pub fn parse_salt(s: &str) -> Result<Salt, BidError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| BidError::InvalidSaltHex(e.to_string()))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| BidError::WrongSaltLength)?;
    Ok(Salt(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_prepare_bid_generates_nonzero_salt() {
        let mut rng = OsRng;
        let bid = prepare_bid(1, 500, &mut rng);
        assert!(!bid.salt.is_zero());
        assert_eq!(
            bid.sealed_hash,
            compute_bid_commitment(1, 500, &bid.salt)
        );
    }

    #[test]
    fn test_prepare_bid_with_zero_salt_rejected() {
        let result = prepare_bid_with_salt(1, 500, Salt([0u8; 32]));
        assert!(matches!(result, Err(BidError::ZeroSalt)));
    }

    #[test]
    fn test_parse_salt_roundtrip() {
        let salt = Salt([7u8; 32]);
        let parsed = parse_salt(&hex::encode(salt.0)).unwrap();
        assert_eq!(parsed, salt);
    }

    #[test]
    fn test_parse_salt_rejects_short_input() {
        assert!(matches!(
            parse_salt("deadbeef"),
            Err(BidError::WrongSaltLength)
        ));
        assert!(matches!(
            parse_salt("zz"),
            Err(BidError::InvalidSaltHex(_))
        ));
    }
}
