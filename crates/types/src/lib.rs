//! Core type definitions for commit-reveal sealed-bid auctions.
//!
//! This crate provides the shared data structures used across the auction
//! engine, including the commitment hash, auction records, escrow entries,
//! and the events emitted by state-changing operations.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

// =========================
// ACCOUNTS & REFERENCES
// =========================

/// Generic account identifier (32 bytes)
pub type Address = [u8; 32];

/// The all-zero address, reserved as "no account".
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Reference to an asset held by an external registry (registry + id).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct AssetRef {
    /// The registry (contract) that tracks ownership of the asset
    pub registry: Address,
    /// Identifier of the asset within its registry
    pub asset_id: u64,
}

// =========================
// COMMITMENT PRIMITIVES
// =========================

/// Reveal salt (32 bytes). The all-zero salt is rejected at commit time.
#[serde_as]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Salt(#[serde_as(as = "[_; 32]")] pub [u8; 32]);

impl Salt {
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

/// SHA-256 binding of (auction id, bid amount, salt).
#[serde_as]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SealedHash(#[serde_as(as = "[_; 32]")] pub [u8; 32]);

/// Compute the commitment hash binding a bid to one auction.
///
/// The auction id is part of the preimage, so a hash recorded for one
/// auction can never be replayed as a commitment in another.
pub fn compute_bid_commitment(auction_id: u64, amount: u64, salt: &Salt) -> SealedHash {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_BID_COMMIT_V1:");
    hasher.update(auction_id.to_le_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.update(salt.0);
    SealedHash(hasher.finalize().into())
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}

// =========================
// AUCTION TYPES
// =========================

/// Auction phase, inferred from the clock rather than stored.
///
/// Deadlines are plain data; every operation derives the phase at its own
/// entry point, so there is no stored phase field that can go stale.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Accepting commitments
    Bidding,
    /// Bidding over, accepting reveals
    Revealing,
    /// Reveal window over, awaiting finalization
    AwaitingFinalize,
    /// Terminal
    Finalized,
}

/// One listed asset-sale event.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub seller: Address,

    /// Asset held in engine custody for the auction's lifetime
    pub asset: AssetRef,

    /// Minimum acceptable bid
    pub starting_price: u64,

    /// Fungible-asset ledger used for settlement
    pub currency: Address,

    // Running result of reveal processing; monotonically non-decreasing
    pub highest_bid: u64,
    pub highest_bidder: Option<Address>,

    pub is_finalized: bool,

    // Timing, fixed at creation
    pub created_at: u64,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,

    /// Number of commit calls received (re-commits included)
    pub bid_count: u64,
}

impl Auction {
    /// Infer the phase at `now`.
    pub fn phase_at(&self, now: u64) -> AuctionPhase {
        if self.is_finalized {
            AuctionPhase::Finalized
        } else if now < self.bidding_deadline {
            AuctionPhase::Bidding
        } else if now <= self.reveal_deadline {
            AuctionPhase::Revealing
        } else {
            AuctionPhase::AwaitingFinalize
        }
    }
}

/// A sealed commitment, one per (auction, bidder).
///
/// Presence in the commitment store is the "committed" marker; a bidder
/// without an entry has never committed, which is distinct from "committed
/// but not yet revealed".
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Commitment {
    pub sealed_hash: SealedHash,
    pub revealed: bool,
}

/// Escrowed deposit, one per (auction, bidder).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct EscrowEntry {
    /// Cumulative amount pulled from the bidder across commit calls
    pub deposited: u64,
    /// Set true exactly once, when the deposit is withdrawn
    pub refunded: bool,
}

/// A disclosed bid, stored in reveal order.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealedBid {
    pub bidder: Address,
    pub amount: u64,
    pub revealed_at: u64,
}

// =========================
// EVENTS
// =========================

/// Events appended to the engine's log by state-changing operations.
///
/// Consumers (indexers, the dev server's query surface) reconstruct
/// off-engine state from these.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum EngineEvent {
    AuctionCreated {
        auction_id: u64,
        seller: Address,
        asset: AssetRef,
        starting_price: u64,
        bidding_deadline: u64,
        reveal_deadline: u64,
    },
    BidCommitted {
        auction_id: u64,
        bidder: Address,
        deposit: u64,
        bid_count: u64,
    },
    BidRevealed {
        bidder: Address,
        auction_id: u64,
        amount: u64,
    },
    AuctionFinalized {
        auction_id: u64,
        winner: Option<Address>,
        winning_bid: u64,
    },
    BidRefunded {
        auction_id: u64,
        bidder: Address,
        amount: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auction_with_deadlines(bidding_deadline: u64, reveal_deadline: u64) -> Auction {
        Auction {
            id: 1,
            seller: [1u8; 32],
            asset: AssetRef {
                registry: [9u8; 32],
                asset_id: 7,
            },
            starting_price: 100,
            currency: [8u8; 32],
            highest_bid: 0,
            highest_bidder: None,
            is_finalized: false,
            created_at: 0,
            bidding_deadline,
            reveal_deadline,
            bid_count: 0,
        }
    }

    #[test]
    fn test_commitment_hash_binds_all_fields() {
        let salt = Salt([7u8; 32]);
        let base = compute_bid_commitment(1, 500, &salt);

        assert_ne!(base, compute_bid_commitment(2, 500, &salt));
        assert_ne!(base, compute_bid_commitment(1, 501, &salt));
        assert_ne!(base, compute_bid_commitment(1, 500, &Salt([8u8; 32])));
        assert_eq!(base, compute_bid_commitment(1, 500, &Salt([7u8; 32])));
    }

    #[test]
    fn test_phase_boundaries() {
        let auction = auction_with_deadlines(1000, 2000);

        assert_eq!(auction.phase_at(0), AuctionPhase::Bidding);
        assert_eq!(auction.phase_at(999), AuctionPhase::Bidding);
        // Bidding closes exactly at the deadline
        assert_eq!(auction.phase_at(1000), AuctionPhase::Revealing);
        // Reveal window is inclusive of its deadline
        assert_eq!(auction.phase_at(2000), AuctionPhase::Revealing);
        assert_eq!(auction.phase_at(2001), AuctionPhase::AwaitingFinalize);
    }

    #[test]
    fn test_finalized_overrides_clock() {
        let mut auction = auction_with_deadlines(1000, 2000);
        auction.is_finalized = true;
        assert_eq!(auction.phase_at(0), AuctionPhase::Finalized);
        assert_eq!(auction.phase_at(5000), AuctionPhase::Finalized);
    }

    #[test]
    fn test_zero_salt_detection() {
        assert!(Salt([0u8; 32]).is_zero());
        assert!(!Salt([1u8; 32]).is_zero());
    }

    #[test]
    fn test_auction_serialization() {
        let auction = auction_with_deadlines(1000, 2000);
        let encoded = borsh::to_vec(&auction).unwrap();
        let decoded: Auction = borsh::from_slice(&encoded).unwrap();
        assert_eq!(auction, decoded);
    }
}
