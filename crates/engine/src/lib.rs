//! Commit-reveal sealed-bid auction engine.
//!
//! This crate implements the engine logic for sealed-bid auctions over
//! externally custodied assets:
//!
//! - Auction creation with engine-wide bidding/reveal windows
//! - Sealed bid commitments with escrowed deposits
//! - Reveal verification against the stored commitment hash
//! - Permissionless finalization and pull-based refunds
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Engine state structures
//! - `ledger`: External asset/currency interfaces and in-memory versions
//! - `config`: Engine-wide window configuration
//! - `error`: Error types
//!
//! Phases are never stored: every handler infers the auction's phase from
//! the current timestamp and the auction's deadlines, so there is no
//! "close" call and no phase field that can go stale.
//!
//! # Example
//!
//! ```ignore
//! use sealbid_engine::{handlers, EngineConfig, EngineState, Ledgers};
//!
//! let mut state = EngineState::new();
//! let config = EngineConfig::default();
//! let ctx = handlers::CallContext { ... };
//!
//! // Create an auction
//! let auction_id =
//!     handlers::handle_create_auction(&mut state, &mut ledgers, &config, &ctx, ...)?;
//!
//! // Commit a sealed bid
//! handlers::handle_commit_bid(&mut state, &mut ledgers, &ctx, auction_id, ...)?;
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod queries;
pub mod state;

pub use call::{AuctionCall, CallOutcome};
pub use config::{ConfigValidationError, EngineConfig};
pub use error::AuctionError;
pub use handlers::{CallContext, FinalizeOutcome, HandlerResult};
pub use ledger::{
    AssetCustody, CurrencyLedger, InMemoryAssetRegistry, InMemoryCurrencyLedger, LedgerError,
    Ledgers, ENGINE_ACCOUNT,
};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::EngineState;
