//! Call handlers for the auction engine.
//!
//! These functions implement the business logic for each call type. Every
//! handler takes the engine state by `&mut`, so the whole read-then-write
//! sequence of one call is a single-writer transaction; callers embedding
//! the engine (the dev server, tests) serialize calls behind one lock.
//!
//! Phase checks are derived from the clock at the top of every handler.
//! There is no stored phase and no explicit "close" call: an auction whose
//! bidding deadline has passed simply rejects commits.

use crate::call::{AuctionCall, CallOutcome};
use crate::config::EngineConfig;
use crate::error::AuctionError;
use crate::ledger::{AssetCustody, CurrencyLedger, LedgerError, Ledgers, ENGINE_ACCOUNT};
use crate::state::EngineState;
use sealbid_types::{
    compute_bid_commitment, Address, AssetRef, Auction, AuctionPhase, EngineEvent, RevealedBid,
    Salt, ZERO_ADDRESS,
};

/// Context provided by the runtime for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Outcome of a successful finalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeOutcome {
    /// Winning bidder, absent when no bid was revealed
    pub winner: Option<Address>,
    /// Winning amount (0 when no bid was revealed)
    pub winning_bid: u64,
    /// How many bids were revealed
    pub num_reveals: u64,
}

/// Handle CreateAuction.
///
/// Pulls custody of the asset into the engine and opens the bidding window.
pub fn handle_create_auction<A: AssetCustody, C: CurrencyLedger>(
    state: &mut EngineState,
    ledgers: &mut Ledgers<A, C>,
    config: &EngineConfig,
    ctx: &CallContext,
    asset: AssetRef,
    starting_price: u64,
    currency: Address,
) -> HandlerResult<u64> {
    if starting_price == 0 {
        return Err(AuctionError::ZeroStartingPrice);
    }
    if currency == ZERO_ADDRESS {
        return Err(AuctionError::ZeroCurrency);
    }
    if ledgers.assets.owner_of(&asset) != Some(ctx.sender) {
        return Err(AuctionError::NotAssetOwner);
    }

    ledgers
        .assets
        .transfer(&asset, ctx.sender, ENGINE_ACCOUNT)
        .map_err(|_| AuctionError::AssetTransferFailed)?;

    let auction_id = state.allocate_auction_id();
    let bidding_deadline = ctx.timestamp + config.bidding_duration;
    let reveal_deadline = bidding_deadline + config.reveal_duration;

    let auction = Auction {
        id: auction_id,
        seller: ctx.sender,
        asset,
        starting_price,
        currency,
        highest_bid: 0,
        highest_bidder: None,
        is_finalized: false,
        created_at: ctx.timestamp,
        bidding_deadline,
        reveal_deadline,
        bid_count: 0,
    };

    state.auctions.insert(auction_id, auction);
    state.record_event(EngineEvent::AuctionCreated {
        auction_id,
        seller: ctx.sender,
        asset,
        starting_price,
        bidding_deadline,
        reveal_deadline,
    });

    Ok(auction_id)
}

/// Handle CommitBid.
///
/// Escrows `amount` and records the commitment hash. A bidder may commit
/// again before the deadline: the new hash replaces the old one and the new
/// deposit is added on top of the previous one; earlier deposits are not
/// refunded here.
pub fn handle_commit_bid<A: AssetCustody, C: CurrencyLedger>(
    state: &mut EngineState,
    ledgers: &mut Ledgers<A, C>,
    ctx: &CallContext,
    auction_id: u64,
    amount: u64,
    salt: Salt,
) -> HandlerResult<()> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    if ctx.sender == auction.seller {
        return Err(AuctionError::SellerCannotBid);
    }
    if auction.phase_at(ctx.timestamp) != AuctionPhase::Bidding {
        return Err(AuctionError::AuctionClosed);
    }
    if amount < auction.starting_price {
        return Err(AuctionError::BelowStartingPrice {
            minimum: auction.starting_price,
            got: amount,
        });
    }
    if salt.is_zero() {
        return Err(AuctionError::ZeroSalt);
    }

    let currency = auction.currency;
    ledgers
        .currency
        .transfer(currency, ctx.sender, ENGINE_ACCOUNT, amount)
        .map_err(|err| match err {
            LedgerError::InsufficientBalance {
                required,
                available,
            } => AuctionError::InsufficientFunds {
                required,
                available,
            },
            other => AuctionError::Ledger(other),
        })?;

    let sealed_hash = compute_bid_commitment(auction_id, amount, &salt);
    state.put_commitment(auction_id, ctx.sender, sealed_hash);
    state.add_deposit(auction_id, ctx.sender, amount);

    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;
    auction.bid_count += 1;
    let bid_count = auction.bid_count;

    state.record_event(EngineEvent::BidCommitted {
        auction_id,
        bidder: ctx.sender,
        deposit: amount,
        bid_count,
    });

    Ok(())
}

/// Handle RevealBid.
///
/// Verifies the disclosed `(amount, salt)` against the stored hash and
/// folds the bid into the running highest. The hash cannot distinguish a
/// wrong amount from a wrong salt, and does not try to.
pub fn handle_reveal_bid(
    state: &mut EngineState,
    ctx: &CallContext,
    auction_id: u64,
    amount: u64,
    salt: Salt,
) -> HandlerResult<()> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let commitment = state
        .get_commitment(auction_id, &ctx.sender)
        .ok_or(AuctionError::NoBidFound)?;

    match auction.phase_at(ctx.timestamp) {
        AuctionPhase::Bidding => return Err(AuctionError::AuctionStillOpen),
        AuctionPhase::Revealing => {}
        AuctionPhase::AwaitingFinalize | AuctionPhase::Finalized => {
            return Err(AuctionError::RevealTimeOver)
        }
    }

    if commitment.revealed {
        return Err(AuctionError::AlreadyRevealed);
    }
    if compute_bid_commitment(auction_id, amount, &salt) != commitment.sealed_hash {
        return Err(AuctionError::WrongAmountOrSalt);
    }

    if let Some(commitment) = state.commitments.get_mut(&(auction_id, ctx.sender)) {
        commitment.revealed = true;
    }
    state.push_reveal(
        auction_id,
        RevealedBid {
            bidder: ctx.sender,
            amount,
            revealed_at: ctx.timestamp,
        },
    );

    // Strict comparison: the earliest reveal keeps the lead on ties, and
    // the running result never decreases.
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;
    if amount > auction.highest_bid {
        auction.highest_bid = amount;
        auction.highest_bidder = Some(ctx.sender);
    }

    state.record_event(EngineEvent::BidRevealed {
        bidder: ctx.sender,
        auction_id,
        amount,
    });

    Ok(())
}

/// Handle FinalizeAuction (permissionless).
///
/// Settles the auction from the running reveal result: the asset goes to
/// the winner, the seller is paid the winning amount out of escrow, and
/// losing deposits stay claimable through withdrawal. With zero reveals
/// the call still succeeds and the asset stays in engine custody.
pub fn handle_finalize_auction<A: AssetCustody, C: CurrencyLedger>(
    state: &mut EngineState,
    ledgers: &mut Ledgers<A, C>,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<FinalizeOutcome> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    match auction.phase_at(ctx.timestamp) {
        AuctionPhase::Finalized => return Err(AuctionError::AuctionAlreadyFinalized),
        AuctionPhase::Bidding => return Err(AuctionError::AuctionStillOpen),
        AuctionPhase::Revealing => return Err(AuctionError::RevealTimeNotOver),
        AuctionPhase::AwaitingFinalize => {}
    }

    // The running result is exactly the maximum over the reveal-ordered
    // list with earliest-reveal tie-break, so no rescan is needed here.
    // Holding `&mut EngineState` across this whole block is what makes the
    // reveal snapshot immutable while the winner is settled.
    let winner = auction.highest_bidder;
    let winning_bid = auction.highest_bid;
    let seller = auction.seller;
    let asset = auction.asset;
    let currency = auction.currency;

    if let Some(winner) = winner {
        // Both transfers move out of engine custody, which the escrow
        // invariant keeps funded; a failure here aborts before any state
        // write below.
        ledgers
            .assets
            .transfer(&asset, ENGINE_ACCOUNT, winner)
            .map_err(|_| AuctionError::AssetTransferFailed)?;
        ledgers
            .currency
            .transfer(currency, ENGINE_ACCOUNT, seller, winning_bid)?;
    }

    let num_reveals = state.get_reveals(auction_id).len() as u64;
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;
    auction.is_finalized = true;

    state.record_event(EngineEvent::AuctionFinalized {
        auction_id,
        winner,
        winning_bid,
    });

    Ok(FinalizeOutcome {
        winner,
        winning_bid,
        num_reveals,
    })
}

/// Handle WithdrawUnrevealedBid.
///
/// Pull-based refund for bidders who never revealed or who lost. The
/// caller must reopen their commitment with the matching `(amount, salt)`
/// pair. Before finalization a revealed bid stays locked, since it may be
/// the winning bid.
pub fn handle_withdraw_unrevealed_bid<A: AssetCustody, C: CurrencyLedger>(
    state: &mut EngineState,
    ledgers: &mut Ledgers<A, C>,
    ctx: &CallContext,
    auction_id: u64,
    amount: u64,
    salt: Salt,
) -> HandlerResult<u64> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let commitment = state
        .get_commitment(auction_id, &ctx.sender)
        .ok_or(AuctionError::NoBidFound)?;

    if compute_bid_commitment(auction_id, amount, &salt) != commitment.sealed_hash {
        return Err(AuctionError::WrongAmountOrSalt);
    }
    if auction.phase_at(ctx.timestamp) == AuctionPhase::Bidding {
        return Err(AuctionError::AuctionStillOpen);
    }
    if auction.is_finalized && auction.highest_bidder == Some(ctx.sender) {
        return Err(AuctionError::CallerAlreadyWonAuction);
    }

    let entry = state
        .get_escrow(auction_id, &ctx.sender)
        .ok_or(AuctionError::NoBidFound)?;
    if entry.refunded {
        return Err(AuctionError::BidAlreadyRefunded);
    }
    if !auction.is_finalized && commitment.revealed {
        return Err(AuctionError::BidAlreadyRevealed);
    }

    let refund = entry.deposited;
    let currency = auction.currency;
    ledgers
        .currency
        .transfer(currency, ENGINE_ACCOUNT, ctx.sender, refund)?;

    if let Some(entry) = state.escrow.get_mut(&(auction_id, ctx.sender)) {
        entry.refunded = true;
    }

    state.record_event(EngineEvent::BidRefunded {
        auction_id,
        bidder: ctx.sender,
        amount: refund,
    });

    Ok(refund)
}

/// Apply a call message by dispatching to its handler.
pub fn apply_call<A: AssetCustody, C: CurrencyLedger>(
    state: &mut EngineState,
    ledgers: &mut Ledgers<A, C>,
    config: &EngineConfig,
    ctx: &CallContext,
    call: AuctionCall,
) -> HandlerResult<CallOutcome> {
    match call {
        AuctionCall::CreateAuction {
            asset,
            starting_price,
            currency,
        } => handle_create_auction(state, ledgers, config, ctx, asset, starting_price, currency)
            .map(CallOutcome::AuctionCreated),

        AuctionCall::CommitBid {
            auction_id,
            amount,
            salt,
        } => handle_commit_bid(state, ledgers, ctx, auction_id, amount, salt)
            .map(|_| CallOutcome::BidCommitted),

        AuctionCall::RevealBid {
            auction_id,
            amount,
            salt,
        } => {
            handle_reveal_bid(state, ctx, auction_id, amount, salt).map(|_| CallOutcome::BidRevealed)
        }

        AuctionCall::FinalizeAuction { auction_id } => {
            handle_finalize_auction(state, ledgers, ctx, auction_id).map(|outcome| {
                CallOutcome::AuctionFinalized {
                    winner: outcome.winner,
                    winning_bid: outcome.winning_bid,
                }
            })
        }

        AuctionCall::WithdrawUnrevealedBid {
            auction_id,
            amount,
            salt,
        } => handle_withdraw_unrevealed_bid(state, ledgers, ctx, auction_id, amount, salt)
            .map(CallOutcome::BidWithdrawn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryAssetRegistry, InMemoryCurrencyLedger};

    const SELLER: Address = [1u8; 32];
    const ALICE: Address = [2u8; 32];
    const BOB: Address = [3u8; 32];
    const TOKEN: Address = [4u8; 32];

    const ASSET: AssetRef = AssetRef {
        registry: [9u8; 32],
        asset_id: 7,
    };

    fn test_config() -> EngineConfig {
        EngineConfig {
            bidding_duration: 1000,
            reveal_duration: 500,
        }
    }

    fn ctx(sender: Address, timestamp: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 100,
            timestamp,
        }
    }

    fn salt(byte: u8) -> Salt {
        Salt([byte; 32])
    }

    type TestLedgers = Ledgers<InMemoryAssetRegistry, InMemoryCurrencyLedger>;

    fn setup() -> (EngineState, TestLedgers) {
        let mut ledgers = Ledgers::new(
            InMemoryAssetRegistry::new(),
            InMemoryCurrencyLedger::new(),
        );
        ledgers.assets.register(ASSET, SELLER);
        ledgers.currency.mint(TOKEN, ALICE, 10_000);
        ledgers.currency.mint(TOKEN, BOB, 10_000);
        (EngineState::new(), ledgers)
    }

    /// Create an auction at t=0 with starting price 200.
    /// Bidding closes at 1000, reveals close at 1500.
    fn create_test_auction(state: &mut EngineState, ledgers: &mut TestLedgers) -> u64 {
        handle_create_auction(
            state,
            ledgers,
            &test_config(),
            &ctx(SELLER, 0),
            ASSET,
            200,
            TOKEN,
        )
        .unwrap()
    }

    #[test]
    fn test_create_auction() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        assert_eq!(auction_id, 1);
        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.seller, SELLER);
        assert_eq!(auction.bidding_deadline, 1000);
        assert_eq!(auction.reveal_deadline, 1500);
        assert_eq!(auction.bid_count, 0);

        // Custody moved to the engine
        assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ENGINE_ACCOUNT));
    }

    #[test]
    fn test_create_auction_rejects_zero_price() {
        let (mut state, mut ledgers) = setup();
        let result = handle_create_auction(
            &mut state,
            &mut ledgers,
            &test_config(),
            &ctx(SELLER, 0),
            ASSET,
            0,
            TOKEN,
        );
        assert!(matches!(result, Err(AuctionError::ZeroStartingPrice)));
        // Custody untouched on failure
        assert_eq!(ledgers.assets.owner_of(&ASSET), Some(SELLER));
    }

    #[test]
    fn test_create_auction_rejects_zero_currency() {
        let (mut state, mut ledgers) = setup();
        let result = handle_create_auction(
            &mut state,
            &mut ledgers,
            &test_config(),
            &ctx(SELLER, 0),
            ASSET,
            200,
            ZERO_ADDRESS,
        );
        assert!(matches!(result, Err(AuctionError::ZeroCurrency)));
    }

    #[test]
    fn test_create_auction_rejects_non_owner() {
        let (mut state, mut ledgers) = setup();
        let result = handle_create_auction(
            &mut state,
            &mut ledgers,
            &test_config(),
            &ctx(ALICE, 0),
            ASSET,
            200,
            TOKEN,
        );
        assert!(matches!(result, Err(AuctionError::NotAssetOwner)));
    }

    #[test]
    fn test_commit_bid_escrows_funds() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        assert_eq!(ledgers.currency.balance_of(TOKEN, ALICE), 9_700);
        assert_eq!(ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT), 300);
        assert_eq!(state.get_escrow(auction_id, &ALICE).unwrap().deposited, 300);
        assert_eq!(state.get_auction(auction_id).unwrap().bid_count, 1);
        assert!(state.get_commitment(auction_id, &ALICE).is_some());
    }

    #[test]
    fn test_seller_cannot_bid() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result = handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(SELLER, 500),
            auction_id,
            300,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::SellerCannotBid)));
    }

    #[test]
    fn test_commit_rejected_at_deadline() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        // Exactly at the deadline counts as closed
        let result = handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1000),
            auction_id,
            300,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::AuctionClosed)));
        assert_eq!(ledgers.currency.balance_of(TOKEN, ALICE), 10_000);
    }

    #[test]
    fn test_commit_below_starting_price() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result = handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            199,
            salt(7),
        );
        assert!(matches!(
            result,
            Err(AuctionError::BelowStartingPrice {
                minimum: 200,
                got: 199
            })
        ));
    }

    #[test]
    fn test_commit_zero_salt() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result = handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            Salt([0u8; 32]),
        );
        assert!(matches!(result, Err(AuctionError::ZeroSalt)));
    }

    #[test]
    fn test_commit_insufficient_funds() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result = handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            20_000,
            salt(7),
        );
        assert!(matches!(
            result,
            Err(AuctionError::InsufficientFunds {
                required: 20_000,
                available: 10_000
            })
        ));
        assert!(state.get_commitment(auction_id, &ALICE).is_none());
    }

    #[test]
    fn test_recommit_accumulates_deposit_and_replaces_hash() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 400),
            auction_id,
            300,
            salt(1),
        )
        .unwrap();
        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 600),
            auction_id,
            500,
            salt(2),
        )
        .unwrap();

        // Both deposits accumulated, no refund of the first
        assert_eq!(state.get_escrow(auction_id, &ALICE).unwrap().deposited, 800);
        assert_eq!(ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT), 800);
        assert_eq!(state.get_auction(auction_id).unwrap().bid_count, 2);

        // Only the second hash survives: the first pair no longer reveals
        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 300, salt(1));
        assert!(matches!(result, Err(AuctionError::WrongAmountOrSalt)));

        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 500, salt(2)).unwrap();
    }

    #[test]
    fn test_reveal_before_bidding_closes() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 999), auction_id, 300, salt(7));
        assert!(matches!(result, Err(AuctionError::AuctionStillOpen)));
    }

    #[test]
    fn test_reveal_after_reveal_deadline() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1501), auction_id, 300, salt(7));
        assert!(matches!(result, Err(AuctionError::RevealTimeOver)));
    }

    #[test]
    fn test_reveal_hash_mismatch() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        // Wrong amount
        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 301, salt(7));
        assert!(matches!(result, Err(AuctionError::WrongAmountOrSalt)));

        // Wrong salt
        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 300, salt(8));
        assert!(matches!(result, Err(AuctionError::WrongAmountOrSalt)));
    }

    #[test]
    fn test_reveal_without_commitment() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 300, salt(7));
        assert!(matches!(result, Err(AuctionError::NoBidFound)));
    }

    #[test]
    fn test_double_reveal_rejected() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 300, salt(7)).unwrap();
        let result = handle_reveal_bid(&mut state, &ctx(ALICE, 1250), auction_id, 300, salt(7));
        assert!(matches!(result, Err(AuctionError::AlreadyRevealed)));
    }

    #[test]
    fn test_running_highest_updates_monotonically() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            500,
            salt(1),
        )
        .unwrap();
        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(BOB, 500),
            auction_id,
            300,
            salt(2),
        )
        .unwrap();

        handle_reveal_bid(&mut state, &ctx(ALICE, 1100), auction_id, 500, salt(1)).unwrap();
        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.highest_bid, 500);
        assert_eq!(auction.highest_bidder, Some(ALICE));

        // Lower reveal does not displace the leader
        handle_reveal_bid(&mut state, &ctx(BOB, 1200), auction_id, 300, salt(2)).unwrap();
        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.highest_bid, 500);
        assert_eq!(auction.highest_bidder, Some(ALICE));
    }

    #[test]
    fn test_tie_break_goes_to_earliest_reveal() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            400,
            salt(1),
        )
        .unwrap();
        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(BOB, 500),
            auction_id,
            400,
            salt(2),
        )
        .unwrap();

        handle_reveal_bid(&mut state, &ctx(BOB, 1100), auction_id, 400, salt(2)).unwrap();
        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 400, salt(1)).unwrap();

        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.highest_bidder, Some(BOB));
    }

    #[test]
    fn test_finalize_too_early() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        let result =
            handle_finalize_auction(&mut state, &mut ledgers, &ctx(SELLER, 500), auction_id);
        assert!(matches!(result, Err(AuctionError::AuctionStillOpen)));

        // During the reveal window (deadline inclusive)
        let result =
            handle_finalize_auction(&mut state, &mut ledgers, &ctx(SELLER, 1500), auction_id);
        assert!(matches!(result, Err(AuctionError::RevealTimeNotOver)));
    }

    #[test]
    fn test_finalize_settles_winner_and_seller() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            500,
            salt(1),
        )
        .unwrap();
        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 500, salt(1)).unwrap();

        let outcome =
            handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1501), auction_id)
                .unwrap();
        assert_eq!(outcome.winner, Some(ALICE));
        assert_eq!(outcome.winning_bid, 500);
        assert_eq!(outcome.num_reveals, 1);

        assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ALICE));
        assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), 500);
        assert!(state.get_auction(auction_id).unwrap().is_finalized);
    }

    #[test]
    fn test_double_finalize_rejected() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1501), auction_id).unwrap();
        let result =
            handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1600), auction_id);
        assert!(matches!(result, Err(AuctionError::AuctionAlreadyFinalized)));
    }

    #[test]
    fn test_finalize_with_no_reveals_keeps_custody() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(1),
        )
        .unwrap();

        // No one reveals; finalization still succeeds
        let outcome =
            handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1501), auction_id)
                .unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.winning_bid, 0);
        assert_eq!(outcome.num_reveals, 0);

        // Asset stays with the engine, seller gets nothing
        assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ENGINE_ACCOUNT));
        assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), 0);
    }

    #[test]
    fn test_withdraw_unrevealed_after_bidding_closes() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        // Before finalize, even before the reveal deadline
        let refund = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1100),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();
        assert_eq!(refund, 300);
        assert_eq!(ledgers.currency.balance_of(TOKEN, ALICE), 10_000);
        assert!(state.get_escrow(auction_id, &ALICE).unwrap().refunded);
    }

    #[test]
    fn test_withdraw_rejected_while_bidding_open() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        let result = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 900),
            auction_id,
            300,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::AuctionStillOpen)));
    }

    #[test]
    fn test_double_refund_rejected() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1100),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        let result = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1200),
            auction_id,
            300,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::BidAlreadyRefunded)));
    }

    #[test]
    fn test_winner_cannot_withdraw() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            500,
            salt(1),
        )
        .unwrap();
        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 500, salt(1)).unwrap();
        handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1501), auction_id).unwrap();

        let result = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1600),
            auction_id,
            500,
            salt(1),
        );
        assert!(matches!(result, Err(AuctionError::CallerAlreadyWonAuction)));
    }

    #[test]
    fn test_revealed_bid_locked_until_finalize() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();
        handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 300, salt(7)).unwrap();

        // Revealed but not yet finalized: the deposit could be the winning
        // bid, so withdrawal is locked.
        let result = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1300),
            auction_id,
            300,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::BidAlreadyRevealed)));
    }

    #[test]
    fn test_withdraw_requires_matching_opening() {
        let (mut state, mut ledgers) = setup();
        let auction_id = create_test_auction(&mut state, &mut ledgers);

        handle_commit_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 500),
            auction_id,
            300,
            salt(7),
        )
        .unwrap();

        let result = handle_withdraw_unrevealed_bid(
            &mut state,
            &mut ledgers,
            &ctx(ALICE, 1100),
            auction_id,
            999,
            salt(7),
        );
        assert!(matches!(result, Err(AuctionError::WrongAmountOrSalt)));
    }

    #[test]
    fn test_apply_call_dispatches() {
        let (mut state, mut ledgers) = setup();
        let config = test_config();

        let outcome = apply_call(
            &mut state,
            &mut ledgers,
            &config,
            &ctx(SELLER, 0),
            AuctionCall::CreateAuction {
                asset: ASSET,
                starting_price: 200,
                currency: TOKEN,
            },
        )
        .unwrap();
        assert_eq!(outcome, CallOutcome::AuctionCreated(1));

        let outcome = apply_call(
            &mut state,
            &mut ledgers,
            &config,
            &ctx(ALICE, 100),
            AuctionCall::CommitBid {
                auction_id: 1,
                amount: 250,
                salt: salt(7),
            },
        )
        .unwrap();
        assert_eq!(outcome, CallOutcome::BidCommitted);
    }
}
