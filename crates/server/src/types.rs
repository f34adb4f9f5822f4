//! RPC-compatible types for the dev server.
//!
//! These types are JSON-serializable versions of the core auction types,
//! with byte fields hex-encoded.

use sealbid_types::{Auction, AuctionPhase, EngineEvent, EscrowEntry, RevealedBid};
use sealbid_engine::queries::AuctionSummary;
use serde::{Deserialize, Serialize};

/// Genesis configuration for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfigRpc {
    pub bidding_duration: Option<u64>,
    pub reveal_duration: Option<u64>,
    pub initial_timestamp: Option<u64>,
}

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    /// Hex-encoded registry address (32 bytes)
    pub asset_registry: String,
    pub asset_id: u64,
    pub starting_price: u64,
    /// Hex-encoded currency address (32 bytes)
    pub currency: String,
}

/// Parameters for committing a sealed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub amount: u64,
    /// Hex-encoded salt (32 bytes)
    pub salt: String,
}

/// Parameters for revealing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub amount: u64,
    /// Hex-encoded salt (32 bytes)
    pub salt: String,
}

/// Parameters for withdrawing a deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub amount: u64,
    /// Hex-encoded salt (32 bytes)
    pub salt: String,
}

/// Auction details for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub id: u64,
    pub seller: String,
    pub asset_registry: String,
    pub asset_id: u64,
    pub starting_price: u64,
    pub currency: String,
    pub highest_bid: u64,
    pub highest_bidder: Option<String>,
    pub is_finalized: bool,
    pub phase: String,
    pub created_at: u64,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,
    pub bid_count: u64,
}

pub fn phase_name(phase: AuctionPhase) -> &'static str {
    match phase {
        AuctionPhase::Bidding => "bidding",
        AuctionPhase::Revealing => "revealing",
        AuctionPhase::AwaitingFinalize => "awaiting_finalize",
        AuctionPhase::Finalized => "finalized",
    }
}

impl AuctionRpc {
    /// Render an auction at a point in time; the phase string is derived
    /// from the clock, like every other phase check.
    pub fn from_auction(auction: &Auction, now: u64) -> Self {
        Self {
            id: auction.id,
            seller: hex::encode(auction.seller),
            asset_registry: hex::encode(auction.asset.registry),
            asset_id: auction.asset.asset_id,
            starting_price: auction.starting_price,
            currency: hex::encode(auction.currency),
            highest_bid: auction.highest_bid,
            highest_bidder: auction.highest_bidder.map(hex::encode),
            is_finalized: auction.is_finalized,
            phase: phase_name(auction.phase_at(now)).to_string(),
            created_at: auction.created_at,
            bidding_deadline: auction.bidding_deadline,
            reveal_deadline: auction.reveal_deadline,
            bid_count: auction.bid_count,
        }
    }
}

/// Auction summary for phase listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSummaryRpc {
    pub auction_id: u64,
    pub seller: String,
    pub phase: String,
    pub starting_price: u64,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,
    pub bid_count: u64,
    pub num_reveals: usize,
}

impl From<AuctionSummary> for AuctionSummaryRpc {
    fn from(summary: AuctionSummary) -> Self {
        Self {
            auction_id: summary.auction_id,
            seller: hex::encode(summary.seller),
            phase: phase_name(summary.phase).to_string(),
            starting_price: summary.starting_price,
            bidding_deadline: summary.bidding_deadline,
            reveal_deadline: summary.reveal_deadline,
            bid_count: summary.bid_count,
            num_reveals: summary.num_reveals,
        }
    }
}

/// Revealed bid for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealedBidRpc {
    pub bidder: String,
    pub amount: u64,
    pub revealed_at: u64,
}

impl From<&RevealedBid> for RevealedBidRpc {
    fn from(bid: &RevealedBid) -> Self {
        Self {
            bidder: hex::encode(bid.bidder),
            amount: bid.amount,
            revealed_at: bid.revealed_at,
        }
    }
}

/// Escrow entry for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowRpc {
    pub deposited: u64,
    pub refunded: bool,
}

impl From<EscrowEntry> for EscrowRpc {
    fn from(entry: EscrowEntry) -> Self {
        Self {
            deposited: entry.deposited,
            refunded: entry.refunded,
        }
    }
}

/// Finalization outcome for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeOutcomeRpc {
    pub winner: Option<String>,
    pub winning_bid: u64,
    pub num_reveals: u64,
}

/// Flattened engine event for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRpc {
    pub kind: String,
    pub auction_id: u64,
    /// The account the event is about (seller, bidder, or winner)
    pub account: Option<String>,
    pub amount: Option<u64>,
}

impl From<&EngineEvent> for EventRpc {
    fn from(event: &EngineEvent) -> Self {
        match event {
            EngineEvent::AuctionCreated {
                auction_id,
                seller,
                starting_price,
                ..
            } => Self {
                kind: "auction_created".to_string(),
                auction_id: *auction_id,
                account: Some(hex::encode(seller)),
                amount: Some(*starting_price),
            },
            EngineEvent::BidCommitted {
                auction_id,
                bidder,
                deposit,
                ..
            } => Self {
                kind: "bid_committed".to_string(),
                auction_id: *auction_id,
                account: Some(hex::encode(bidder)),
                amount: Some(*deposit),
            },
            EngineEvent::BidRevealed {
                bidder,
                auction_id,
                amount,
            } => Self {
                kind: "bid_revealed".to_string(),
                auction_id: *auction_id,
                account: Some(hex::encode(bidder)),
                amount: Some(*amount),
            },
            EngineEvent::AuctionFinalized {
                auction_id,
                winner,
                winning_bid,
            } => Self {
                kind: "auction_finalized".to_string(),
                auction_id: *auction_id,
                account: winner.map(hex::encode),
                amount: Some(*winning_bid),
            },
            EngineEvent::BidRefunded {
                auction_id,
                bidder,
                amount,
            } => Self {
                kind: "bid_refunded".to_string(),
                auction_id: *auction_id,
                account: Some(hex::encode(bidder)),
                amount: Some(*amount),
            },
        }
    }
}
