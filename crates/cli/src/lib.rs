//! Client SDK for bidding in commit-reveal sealed-bid auctions.
//!
//! This crate provides a high-level API for:
//! - Generating reveal salts and commitment hashes locally
//! - Preparing bids for submission
//! - Keeping the reveal opening `(amount, salt)` until the reveal window

pub mod bid;

pub use bid::{parse_salt, prepare_bid, prepare_bid_with_salt, PreparedBid};
