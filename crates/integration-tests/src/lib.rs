//! End-to-end integration tests for the sealed-bid auction engine.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Auction creation with asset custody
//! 2. Sealed bid commitment with escrowed deposits
//! 3. Reveal verification
//! 4. Finalization and settlement
//! 5. Pull-based refunds

use sealbid_cli::prepare_bid;
use sealbid_engine::handlers::apply_call;
use sealbid_engine::{
    handlers::{
        handle_commit_bid, handle_create_auction, handle_finalize_auction, handle_reveal_bid,
        handle_withdraw_unrevealed_bid,
    },
    queries::{self, AuctionQuery, AuctionQueryResponse},
    AssetCustody, AuctionCall, AuctionError, CallContext, CallOutcome, CurrencyLedger,
    EngineConfig, EngineState, InMemoryAssetRegistry, InMemoryCurrencyLedger, Ledgers,
    ENGINE_ACCOUNT,
};
use sealbid_types::{Address, AssetRef, EngineEvent, Salt};

use rand::rngs::OsRng;

const SELLER: Address = [1u8; 32];
const ALICE: Address = [2u8; 32];
const BOB: Address = [3u8; 32];
const CAROL: Address = [4u8; 32];
const TOKEN: Address = [5u8; 32];

const ASSET: AssetRef = AssetRef {
    registry: [9u8; 32],
    asset_id: 1,
};

type TestLedgers = Ledgers<InMemoryAssetRegistry, InMemoryCurrencyLedger>;

fn config() -> EngineConfig {
    EngineConfig {
        bidding_duration: 1000,
        reveal_duration: 500,
    }
}

fn ctx(sender: Address, timestamp: u64) -> CallContext {
    CallContext {
        sender,
        block_height: 0,
        timestamp,
    }
}

fn salt(byte: u8) -> Salt {
    Salt([byte; 32])
}

fn setup() -> (EngineState, TestLedgers) {
    let mut ledgers = Ledgers::new(InMemoryAssetRegistry::new(), InMemoryCurrencyLedger::new());
    ledgers.assets.register(ASSET, SELLER);
    ledgers.currency.mint(TOKEN, ALICE, 1_000);
    ledgers.currency.mint(TOKEN, BOB, 1_000);
    ledgers.currency.mint(TOKEN, CAROL, 1_000);
    (EngineState::new(), ledgers)
}

/// The scenario from the engine's docs: starting price 200, Bob commits
/// 200, Alice commits 500, both reveal, Alice wins, Bob withdraws.
#[test]
fn test_full_auction_lifecycle() {
    let (mut state, mut ledgers) = setup();

    // ========================================
    // Phase 1: Seller lists the asset
    // ========================================

    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        200,
        TOKEN,
    )
    .unwrap();

    assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ENGINE_ACCOUNT));
    println!("Auction {} created, asset in custody", auction_id);

    // ========================================
    // Phase 2: Sealed commitments
    // ========================================

    let bob_salt = salt(11);
    let alice_salt = salt(22);

    handle_commit_bid(
        &mut state,
        &mut ledgers,
        &ctx(BOB, 100),
        auction_id,
        200,
        bob_salt,
    )
    .unwrap();
    handle_commit_bid(
        &mut state,
        &mut ledgers,
        &ctx(ALICE, 200),
        auction_id,
        500,
        alice_salt,
    )
    .unwrap();

    assert_eq!(ledgers.currency.balance_of(TOKEN, BOB), 800);
    assert_eq!(ledgers.currency.balance_of(TOKEN, ALICE), 500);
    assert_eq!(ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT), 700);
    assert_eq!(state.get_auction(auction_id).unwrap().bid_count, 2);
    println!("2 sealed bids committed, 700 escrowed");

    // ========================================
    // Phase 3: Reveals after the bidding window
    // ========================================

    handle_reveal_bid(&mut state, &ctx(BOB, 1100), auction_id, 200, bob_salt).unwrap();
    handle_reveal_bid(&mut state, &ctx(ALICE, 1200), auction_id, 500, alice_salt).unwrap();

    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.highest_bid, 500);
    assert_eq!(auction.highest_bidder, Some(ALICE));
    println!("Both bids revealed; Alice leads at 500");

    // ========================================
    // Phase 4: Finalization
    // ========================================

    let outcome =
        handle_finalize_auction(&mut state, &mut ledgers, &ctx(CAROL, 1501), auction_id).unwrap();
    assert_eq!(outcome.winner, Some(ALICE));
    assert_eq!(outcome.winning_bid, 500);

    assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ALICE));
    assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), 500);
    println!("Finalized: asset to Alice, seller paid 500");

    // ========================================
    // Phase 5: Loser withdraws
    // ========================================

    let refund = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(BOB, 1600),
        auction_id,
        200,
        bob_salt,
    )
    .unwrap();
    assert_eq!(refund, 200);
    assert_eq!(ledgers.currency.balance_of(TOKEN, BOB), 1_000);
    assert_eq!(ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT), 0);
    println!("Bob refunded; engine holds nothing");

    // Winner cannot also withdraw
    let result = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(ALICE, 1700),
        auction_id,
        500,
        alice_salt,
    );
    assert!(matches!(result, Err(AuctionError::CallerAlreadyWonAuction)));
}

/// A bidder who never reveals can reclaim the deposit as soon as bidding
/// closes, without waiting for the reveal window or finalization.
#[test]
fn test_unrevealed_bidder_withdraws_early() {
    let (mut state, mut ledgers) = setup();
    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        200,
        TOKEN,
    )
    .unwrap();

    let carol_salt = salt(33);
    handle_commit_bid(
        &mut state,
        &mut ledgers,
        &ctx(CAROL, 100),
        auction_id,
        300,
        carol_salt,
    )
    .unwrap();

    // Still inside the reveal window, finalize has not run
    let refund = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(CAROL, 1100),
        auction_id,
        300,
        carol_salt,
    )
    .unwrap();
    assert_eq!(refund, 300);
    assert_eq!(ledgers.currency.balance_of(TOKEN, CAROL), 1_000);
}

/// Finalization with zero reveals succeeds, transfers nothing, and leaves
/// the asset in engine custody.
#[test]
fn test_finalize_with_no_reveals() {
    let (mut state, mut ledgers) = setup();
    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        200,
        TOKEN,
    )
    .unwrap();

    handle_commit_bid(
        &mut state,
        &mut ledgers,
        &ctx(ALICE, 100),
        auction_id,
        400,
        salt(1),
    )
    .unwrap();

    let outcome =
        handle_finalize_auction(&mut state, &mut ledgers, &ctx(CAROL, 1501), auction_id).unwrap();
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.num_reveals, 0);

    assert_eq!(ledgers.assets.owner_of(&ASSET), Some(ENGINE_ACCOUNT));
    assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), 0);

    // Alice never revealed, so her deposit is still claimable
    let refund = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(ALICE, 1600),
        auction_id,
        400,
        salt(1),
    )
    .unwrap();
    assert_eq!(refund, 400);
}

/// No funds are created or destroyed across the lifecycle: at every stage
/// the engine's holdings equal outstanding escrow, and after settlement
/// the seller payout plus refunds account for everything pulled.
#[test]
fn test_escrow_conservation() {
    let (mut state, mut ledgers) = setup();
    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        100,
        TOKEN,
    )
    .unwrap();

    // Alice re-commits, so her escrow accumulates
    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 10), auction_id, 300, salt(1))
        .unwrap();
    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 20), auction_id, 450, salt(2))
        .unwrap();
    handle_commit_bid(&mut state, &mut ledgers, &ctx(BOB, 30), auction_id, 200, salt(3))
        .unwrap();
    handle_commit_bid(&mut state, &mut ledgers, &ctx(CAROL, 40), auction_id, 150, salt(4))
        .unwrap();

    let total_pulled = 300 + 450 + 200 + 150;
    assert_eq!(
        ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT),
        total_pulled
    );
    assert_eq!(state.outstanding_escrow(auction_id), total_pulled);

    // Alice reveals her live hash (450), Bob reveals, Carol never does
    handle_reveal_bid(&mut state, &ctx(ALICE, 1100), auction_id, 450, salt(2)).unwrap();
    handle_reveal_bid(&mut state, &ctx(BOB, 1150), auction_id, 200, salt(3)).unwrap();

    handle_finalize_auction(&mut state, &mut ledgers, &ctx(CAROL, 1501), auction_id).unwrap();

    // Seller got the winning amount
    assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), 450);

    // Losers reclaim in full
    let bob_refund = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(BOB, 1600),
        auction_id,
        200,
        salt(3),
    )
    .unwrap();
    let carol_refund = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(CAROL, 1600),
        auction_id,
        150,
        salt(4),
    )
    .unwrap();

    // Winner's residual (750 deposited - 450 paid out) stays custodied:
    // payout + refunds + residual == everything pulled
    let residual = ledgers.currency.balance_of(TOKEN, ENGINE_ACCOUNT);
    assert_eq!(residual, 300);
    assert_eq!(450 + bob_refund + carol_refund + residual, total_pulled);
}

/// The terminal state is permanent: neither finalize nor refunds repeat.
#[test]
fn test_exactly_once_settlement() {
    let (mut state, mut ledgers) = setup();
    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        200,
        TOKEN,
    )
    .unwrap();

    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 100), auction_id, 500, salt(1))
        .unwrap();
    handle_commit_bid(&mut state, &mut ledgers, &ctx(BOB, 100), auction_id, 300, salt(2))
        .unwrap();
    handle_reveal_bid(&mut state, &ctx(ALICE, 1100), auction_id, 500, salt(1)).unwrap();
    handle_reveal_bid(&mut state, &ctx(BOB, 1100), auction_id, 300, salt(2)).unwrap();

    handle_finalize_auction(&mut state, &mut ledgers, &ctx(CAROL, 1501), auction_id).unwrap();
    let seller_balance = ledgers.currency.balance_of(TOKEN, SELLER);
    let asset_owner = ledgers.assets.owner_of(&ASSET);

    // Second finalize is rejected and changes nothing
    let result = handle_finalize_auction(&mut state, &mut ledgers, &ctx(CAROL, 1600), auction_id);
    assert!(matches!(result, Err(AuctionError::AuctionAlreadyFinalized)));
    assert_eq!(ledgers.currency.balance_of(TOKEN, SELLER), seller_balance);
    assert_eq!(ledgers.assets.owner_of(&ASSET), asset_owner);

    // Refund succeeds once, then is rejected
    handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(BOB, 1600),
        auction_id,
        300,
        salt(2),
    )
    .unwrap();
    let result = handle_withdraw_unrevealed_bid(
        &mut state,
        &mut ledgers,
        &ctx(BOB, 1700),
        auction_id,
        300,
        salt(2),
    );
    assert!(matches!(result, Err(AuctionError::BidAlreadyRefunded)));
    assert_eq!(ledgers.currency.balance_of(TOKEN, BOB), 1_000);
}

/// The commitment hash binds the auction id: identical (amount, salt)
/// pairs produce different hashes in different auctions.
#[test]
fn test_commitments_do_not_cross_auctions() {
    let (mut state, mut ledgers) = setup();
    let second_asset = AssetRef {
        registry: [9u8; 32],
        asset_id: 2,
    };
    ledgers.assets.register(second_asset, SELLER);

    let first = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        100,
        TOKEN,
    )
    .unwrap();
    let second = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        second_asset,
        100,
        TOKEN,
    )
    .unwrap();

    let shared_salt = salt(42);
    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 10), first, 300, shared_salt)
        .unwrap();
    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 20), second, 300, shared_salt)
        .unwrap();

    let hash_one = state.get_commitment(first, &ALICE).unwrap().sealed_hash;
    let hash_two = state.get_commitment(second, &ALICE).unwrap().sealed_hash;
    assert_ne!(hash_one, hash_two);

    // Both reveal fine in their own auction
    handle_reveal_bid(&mut state, &ctx(ALICE, 1100), first, 300, shared_salt).unwrap();
    handle_reveal_bid(&mut state, &ctx(ALICE, 1100), second, 300, shared_salt).unwrap();
}

/// Phase gates hold exactly at the boundaries.
#[test]
fn test_phase_gating() {
    let (mut state, mut ledgers) = setup();
    let auction_id = handle_create_auction(
        &mut state,
        &mut ledgers,
        &config(),
        &ctx(SELLER, 0),
        ASSET,
        200,
        TOKEN,
    )
    .unwrap();

    handle_commit_bid(&mut state, &mut ledgers, &ctx(ALICE, 999), auction_id, 300, salt(1))
        .unwrap();

    // Commit at the bidding deadline is closed
    let result =
        handle_commit_bid(&mut state, &mut ledgers, &ctx(BOB, 1000), auction_id, 300, salt(2));
    assert!(matches!(result, Err(AuctionError::AuctionClosed)));

    // Reveal before the bidding deadline is too early
    let result = handle_reveal_bid(&mut state, &ctx(ALICE, 999), auction_id, 300, salt(1));
    assert!(matches!(result, Err(AuctionError::AuctionStillOpen)));

    // Finalize inside the reveal window is too early
    let result = handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1500), auction_id);
    assert!(matches!(result, Err(AuctionError::RevealTimeNotOver)));

    // Reveal at the reveal deadline still lands
    handle_reveal_bid(&mut state, &ctx(ALICE, 1500), auction_id, 300, salt(1)).unwrap();

    // One past it does not
    let result = handle_reveal_bid(&mut state, &ctx(BOB, 1501), auction_id, 300, salt(2));
    assert!(matches!(result, Err(AuctionError::NoBidFound)));

    let result = handle_finalize_auction(&mut state, &mut ledgers, &ctx(BOB, 1501), auction_id);
    assert!(result.is_ok());
}

/// Drive the whole flow through the call-message layer and read results
/// back through the query layer.
#[test]
fn test_call_and_query_surface() {
    let (mut state, mut ledgers) = setup();
    let engine_config = config();

    let outcome = apply_call(
        &mut state,
        &mut ledgers,
        &engine_config,
        &ctx(SELLER, 0),
        AuctionCall::CreateAuction {
            asset: ASSET,
            starting_price: 200,
            currency: TOKEN,
        },
    )
    .unwrap();
    let auction_id = match outcome {
        CallOutcome::AuctionCreated(id) => id,
        other => panic!("unexpected outcome: {:?}", other),
    };

    // Prepare bids the way the CLI does
    let alice_bid = prepare_bid(auction_id, 500, &mut OsRng);
    let bob_bid = prepare_bid(auction_id, 250, &mut OsRng);

    for (sender, bid) in [(ALICE, &alice_bid), (BOB, &bob_bid)] {
        apply_call(
            &mut state,
            &mut ledgers,
            &engine_config,
            &ctx(sender, 100),
            AuctionCall::CommitBid {
                auction_id,
                amount: bid.amount,
                salt: bid.salt,
            },
        )
        .unwrap();
    }

    match queries::handle_query(&state, AuctionQuery::GetAuctionBidCount { auction_id }) {
        AuctionQueryResponse::BidCount(Some(2)) => {}
        other => panic!("unexpected response: {:?}", other),
    }

    for (sender, bid) in [(ALICE, &alice_bid), (BOB, &bob_bid)] {
        apply_call(
            &mut state,
            &mut ledgers,
            &engine_config,
            &ctx(sender, 1200),
            AuctionCall::RevealBid {
                auction_id,
                amount: bid.amount,
                salt: bid.salt,
            },
        )
        .unwrap();
    }

    let outcome = apply_call(
        &mut state,
        &mut ledgers,
        &engine_config,
        &ctx(CAROL, 1501),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .unwrap();
    assert_eq!(
        outcome,
        CallOutcome::AuctionFinalized {
            winner: Some(ALICE),
            winning_bid: 500
        }
    );

    let outcome = apply_call(
        &mut state,
        &mut ledgers,
        &engine_config,
        &ctx(BOB, 1600),
        AuctionCall::WithdrawUnrevealedBid {
            auction_id,
            amount: bob_bid.amount,
            salt: bob_bid.salt,
        },
    )
    .unwrap();
    assert_eq!(outcome, CallOutcome::BidWithdrawn(250));

    // The event log tells the whole story in order
    match queries::handle_query(&state, AuctionQuery::GetEvents { offset: 0 }) {
        AuctionQueryResponse::Events(events) => {
            let kinds: Vec<&str> = events
                .iter()
                .map(|event| match event {
                    EngineEvent::AuctionCreated { .. } => "created",
                    EngineEvent::BidCommitted { .. } => "committed",
                    EngineEvent::BidRevealed { .. } => "revealed",
                    EngineEvent::AuctionFinalized { .. } => "finalized",
                    EngineEvent::BidRefunded { .. } => "refunded",
                })
                .collect();
            assert_eq!(
                kinds,
                vec![
                    "created",
                    "committed",
                    "committed",
                    "revealed",
                    "revealed",
                    "finalized",
                    "refunded"
                ]
            );
        }
        other => panic!("unexpected response: {:?}", other),
    }
}
