//! Query handlers for the auction engine.
//!
//! These functions provide read-only access to engine state.

use crate::state::EngineState;
use sealbid_types::{
    Address, Auction, AuctionPhase, Commitment, EngineEvent, EscrowEntry, RevealedBid,
};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get auction details by ID.
    GetAuction { auction_id: u64 },

    /// Number of commit calls an auction has received.
    GetAuctionBidCount { auction_id: u64 },

    /// Get all auctions (paginated).
    ListAuctions { offset: u64, limit: u64 },

    /// Get a bidder's commitment.
    GetCommitment { auction_id: u64, bidder: Address },

    /// Get revealed bids for an auction, in reveal order.
    GetRevealedBids { auction_id: u64 },

    /// Get a bidder's escrow entry.
    GetEscrow { auction_id: u64, bidder: Address },

    /// Get the event log from an offset.
    GetEvents { offset: u64 },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Auction(Option<Auction>),
    BidCount(Option<u64>),
    AuctionList(Vec<Auction>),
    Commitment(Option<Commitment>),
    RevealedBids(Vec<RevealedBid>),
    Escrow(Option<EscrowEntry>),
    Events(Vec<EngineEvent>),
}

/// Handle a query.
pub fn handle_query(state: &EngineState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetAuction { auction_id } => {
            AuctionQueryResponse::Auction(state.get_auction(auction_id).cloned())
        }

        AuctionQuery::GetAuctionBidCount { auction_id } => AuctionQueryResponse::BidCount(
            state.get_auction(auction_id).map(|auction| auction.bid_count),
        ),

        AuctionQuery::ListAuctions { offset, limit } => {
            let mut auctions: Vec<Auction> = state.auctions.values().cloned().collect();
            auctions.sort_by_key(|auction| auction.id);
            AuctionQueryResponse::AuctionList(
                auctions
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect(),
            )
        }

        AuctionQuery::GetCommitment { auction_id, bidder } => {
            AuctionQueryResponse::Commitment(state.get_commitment(auction_id, &bidder).cloned())
        }

        AuctionQuery::GetRevealedBids { auction_id } => {
            AuctionQueryResponse::RevealedBids(state.get_reveals(auction_id).to_vec())
        }

        AuctionQuery::GetEscrow { auction_id, bidder } => {
            AuctionQueryResponse::Escrow(state.get_escrow(auction_id, &bidder).copied())
        }

        AuctionQuery::GetEvents { offset } => AuctionQueryResponse::Events(
            state.events.iter().skip(offset as usize).cloned().collect(),
        ),
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub seller: Address,
    pub phase: AuctionPhase,
    pub starting_price: u64,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,
    pub bid_count: u64,
    pub num_reveals: usize,
}

impl AuctionSummary {
    /// Build a summary at a point in time.
    pub fn from_auction(auction: &Auction, now: u64, num_reveals: usize) -> Self {
        Self {
            auction_id: auction.id,
            seller: auction.seller,
            phase: auction.phase_at(now),
            starting_price: auction.starting_price,
            bidding_deadline: auction.bidding_deadline,
            reveal_deadline: auction.reveal_deadline,
            bid_count: auction.bid_count,
            num_reveals,
        }
    }
}

fn summaries_in_phase(state: &EngineState, now: u64, phase: AuctionPhase) -> Vec<AuctionSummary> {
    let mut matching: Vec<&Auction> = state
        .auctions
        .values()
        .filter(|auction| auction.phase_at(now) == phase)
        .collect();
    matching.sort_by_key(|auction| auction.id);
    matching
        .into_iter()
        .map(|auction| {
            AuctionSummary::from_auction(auction, now, state.get_reveals(auction.id).len())
        })
        .collect()
}

/// Auctions currently accepting commitments.
pub fn get_open_auctions(state: &EngineState, now: u64) -> Vec<AuctionSummary> {
    summaries_in_phase(state, now, AuctionPhase::Bidding)
}

/// Auctions currently accepting reveals.
pub fn get_revealing_auctions(state: &EngineState, now: u64) -> Vec<AuctionSummary> {
    summaries_in_phase(state, now, AuctionPhase::Revealing)
}

/// Auctions past their reveal window that no one has finalized yet.
pub fn get_awaiting_finalize(state: &EngineState, now: u64) -> Vec<AuctionSummary> {
    summaries_in_phase(state, now, AuctionPhase::AwaitingFinalize)
}
