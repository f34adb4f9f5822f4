//! Engine state structures.

use std::collections::HashMap;

use sealbid_types::{
    Address, Auction, Commitment, EngineEvent, EscrowEntry, RevealedBid, SealedHash,
};

/// The auction engine's state.
///
/// One instance holds every auction the engine runs. All mutation happens
/// through `&mut` handler calls, which is what serializes operations; there
/// is no interior mutability here.
#[derive(Debug, Default)]
pub struct EngineState {
    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// All auctions by ID
    pub auctions: HashMap<u64, Auction>,

    /// Sealed commitments: (auction_id, bidder) -> commitment
    pub commitments: HashMap<(u64, Address), Commitment>,

    /// Escrow ledger: (auction_id, bidder) -> accumulated deposit
    pub escrow: HashMap<(u64, Address), EscrowEntry>,

    /// Revealed bids per auction, in reveal order
    pub reveals: HashMap<u64, Vec<RevealedBid>>,

    /// Append-only event log
    pub events: Vec<EngineEvent>,
}

impl EngineState {
    /// Create a new engine state.
    pub fn new() -> Self {
        Self {
            next_auction_id: 1,
            ..Default::default()
        }
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> u64 {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        id
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    /// Get mutable auction by ID.
    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.auctions.get_mut(&auction_id)
    }

    /// Get a bidder's commitment for an auction.
    pub fn get_commitment(&self, auction_id: u64, bidder: &Address) -> Option<&Commitment> {
        self.commitments.get(&(auction_id, *bidder))
    }

    /// Record or overwrite a bidder's commitment. Overwriting resets the
    /// revealed marker: only the live hash can be revealed.
    pub fn put_commitment(&mut self, auction_id: u64, bidder: Address, sealed_hash: SealedHash) {
        self.commitments.insert(
            (auction_id, bidder),
            Commitment {
                sealed_hash,
                revealed: false,
            },
        );
    }

    /// Get a bidder's escrow entry for an auction.
    pub fn get_escrow(&self, auction_id: u64, bidder: &Address) -> Option<&EscrowEntry> {
        self.escrow.get(&(auction_id, *bidder))
    }

    /// Accumulate a deposit into a bidder's escrow entry.
    pub fn add_deposit(&mut self, auction_id: u64, bidder: Address, amount: u64) {
        let entry = self.escrow.entry((auction_id, bidder)).or_default();
        entry.deposited += amount;
    }

    /// Revealed bids for an auction, in reveal order.
    pub fn get_reveals(&self, auction_id: u64) -> &[RevealedBid] {
        self.reveals
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a revealed bid.
    pub fn push_reveal(&mut self, auction_id: u64, reveal: RevealedBid) {
        self.reveals.entry(auction_id).or_default().push(reveal);
    }

    /// Sum of deposits for an auction that have not been refunded yet.
    pub fn outstanding_escrow(&self, auction_id: u64) -> u64 {
        self.escrow
            .iter()
            .filter(|((aid, _), entry)| *aid == auction_id && !entry.refunded)
            .map(|(_, entry)| entry.deposited)
            .sum()
    }

    /// Append an event to the log.
    pub fn record_event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}
