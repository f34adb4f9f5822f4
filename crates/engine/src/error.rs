//! Auction engine error types.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur in the auction engine.
///
/// Every rejection carries a stable identifier and leaves state unchanged;
/// all of them are recoverable by retrying with corrected input or waiting
/// for the right phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    // === Caller authorization ===
    #[error("Caller does not own the asset")]
    NotAssetOwner,

    #[error("Seller cannot bid on their own auction")]
    SellerCannotBid,

    // === Creation parameters ===
    #[error("Starting price must be non-zero")]
    ZeroStartingPrice,

    #[error("Settlement currency must be non-zero")]
    ZeroCurrency,

    #[error("Salt must be non-zero")]
    ZeroSalt,

    // === Phase violations ===
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Bidding window has closed")]
    AuctionClosed,

    #[error("Bidding window is still open")]
    AuctionStillOpen,

    #[error("Reveal window has passed")]
    RevealTimeOver,

    #[error("Reveal window is not over yet")]
    RevealTimeNotOver,

    #[error("Auction already finalized")]
    AuctionAlreadyFinalized,

    // === Data integrity ===
    #[error("No bid found for caller")]
    NoBidFound,

    #[error("Bid below starting price: minimum {minimum}, got {got}")]
    BelowStartingPrice { minimum: u64, got: u64 },

    #[error("Commitment hash mismatch")]
    WrongAmountOrSalt,

    #[error("Bid already revealed")]
    AlreadyRevealed,

    #[error("Bid already refunded")]
    BidAlreadyRefunded,

    #[error("Caller won the auction and cannot withdraw")]
    CallerAlreadyWonAuction,

    #[error("Bid was revealed and is locked until finalization")]
    BidAlreadyRevealed,

    // === Resource failures ===
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Asset transfer failed")]
    AssetTransferFailed,

    #[error("Ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),
}
