//! Call message types for the auction engine.

use borsh::{BorshDeserialize, BorshSerialize};

use sealbid_types::{Address, AssetRef, Salt};

/// State-changing calls accepted by the engine.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// List an asset for sale. Pulls the asset into engine custody.
    CreateAuction {
        asset: AssetRef,
        starting_price: u64,
        currency: Address,
    },

    /// Commit a sealed bid and escrow the amount.
    CommitBid {
        auction_id: u64,
        amount: u64,
        salt: Salt,
    },

    /// Disclose a previously committed bid.
    RevealBid {
        auction_id: u64,
        amount: u64,
        salt: Salt,
    },

    /// Settle the auction (permissionless).
    FinalizeAuction { auction_id: u64 },

    /// Reclaim an unrevealed or losing deposit.
    WithdrawUnrevealedBid {
        auction_id: u64,
        amount: u64,
        salt: Salt,
    },
}

/// What a successfully applied call produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    /// New auction id
    AuctionCreated(u64),
    BidCommitted,
    BidRevealed,
    /// Winner (if any bid was revealed) and the winning amount
    AuctionFinalized {
        winner: Option<Address>,
        winning_bid: u64,
    },
    /// Amount returned to the caller
    BidWithdrawn(u64),
}
