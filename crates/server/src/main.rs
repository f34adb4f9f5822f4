//! Dev server for local testing of the sealed-bid auction engine.
//!
//! This provides a JSON-RPC server that wraps the engine, the in-memory
//! asset registry, and the in-memory currency ledger behind a simulated
//! chain clock, without requiring a real blockchain.

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use sealbid_engine::{
    handlers, queries, CallContext, EngineConfig, EngineState, InMemoryAssetRegistry,
    InMemoryCurrencyLedger, Ledgers,
};
use sealbid_types::{Address, AssetRef, Salt};

mod types;
use types::*;

/// Shared chain state.
///
/// Every RPC method takes the write lock for the full call, which gives
/// the engine the single global ordering of operations it assumes.
struct ChainState {
    engine: EngineState,
    ledgers: Ledgers<InMemoryAssetRegistry, InMemoryCurrencyLedger>,
    config: EngineConfig,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new() -> Self {
        Self {
            engine: EngineState::new(),
            ledgers: Ledgers::new(
                InMemoryAssetRegistry::new(),
                InMemoryCurrencyLedger::new(),
            ),
            config: EngineConfig::default(),
            block_height: 0,
            timestamp: 0,
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += 12; // ~12 second blocks
    }

    fn context(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
        }
    }
}

/// RPC API definition for the dev server.
#[rpc(server)]
pub trait AuctionChainApi {
    // ============ Admin Methods ============

    /// Initialize engine configuration and the starting timestamp.
    #[method(name = "admin_init")]
    async fn admin_init(&self, config: InitConfigRpc) -> Result<bool, ErrorObjectOwned>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Credit an account on the in-memory currency ledger.
    #[method(name = "admin_mint")]
    async fn admin_mint(
        &self,
        currency: String,
        account: String,
        amount: u64,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Register an asset with an owner on the in-memory registry.
    #[method(name = "admin_registerAsset")]
    async fn admin_register_asset(
        &self,
        registry: String,
        asset_id: u64,
        owner: String,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Create a new auction.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned>;

    /// Commit a sealed bid, escrowing the amount.
    #[method(name = "auction_commitBid")]
    async fn auction_commit_bid(&self, params: CommitBidParams)
        -> Result<bool, ErrorObjectOwned>;

    /// Reveal a previously committed bid.
    #[method(name = "auction_revealBid")]
    async fn auction_reveal_bid(&self, params: RevealBidParams)
        -> Result<bool, ErrorObjectOwned>;

    /// Finalize an auction (permissionless).
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<FinalizeOutcomeRpc, ErrorObjectOwned>;

    /// Withdraw an unrevealed or losing deposit.
    #[method(name = "auction_withdrawBid")]
    async fn auction_withdraw_bid(
        &self,
        params: WithdrawBidParams,
    ) -> Result<u64, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned>;

    /// Number of commit calls an auction has received.
    #[method(name = "query_getBidCount")]
    async fn query_get_bid_count(
        &self,
        auction_id: u64,
    ) -> Result<Option<u64>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned>;

    /// Auctions currently accepting commitments.
    #[method(name = "query_listOpenAuctions")]
    async fn query_list_open_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// Auctions past their reveal window, not yet finalized.
    #[method(name = "query_listAwaitingFinalize")]
    async fn query_list_awaiting_finalize(
        &self,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// Revealed bids for an auction, in reveal order.
    #[method(name = "query_getRevealedBids")]
    async fn query_get_revealed_bids(
        &self,
        auction_id: u64,
    ) -> Result<Vec<RevealedBidRpc>, ErrorObjectOwned>;

    /// A bidder's escrow entry for an auction.
    #[method(name = "query_getEscrow")]
    async fn query_get_escrow(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<EscrowRpc>, ErrorObjectOwned>;

    /// Engine event log from an offset.
    #[method(name = "query_getEvents")]
    async fn query_get_events(&self, offset: u64) -> Result<Vec<EventRpc>, ErrorObjectOwned>;

    /// Balance on the in-memory currency ledger.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(
        &self,
        currency: String,
        account: String,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Current owner of an asset on the in-memory registry.
    #[method(name = "query_getAssetOwner")]
    async fn query_get_asset_owner(
        &self,
        registry: String,
        asset_id: u64,
    ) -> Result<Option<String>, ErrorObjectOwned>;
}

/// Implementation of the dev server.
struct AuctionChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl AuctionChainServer {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new())),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }
}

#[async_trait]
impl AuctionChainApiServer for AuctionChainServer {
    async fn admin_init(&self, config: InitConfigRpc) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();

        if let Some(duration) = config.bidding_duration {
            state.config.bidding_duration = duration;
        }
        if let Some(duration) = config.reveal_duration {
            state.config.reveal_duration = duration;
        }
        state
            .config
            .validate()
            .map_err(|e| Self::rpc_error(&format!("Invalid config: {}", e)))?;

        if let Some(ts) = config.initial_timestamp {
            state.timestamp = ts;
        }

        info!(
            "Engine initialized: bidding {}s, reveal {}s",
            state.config.bidding_duration, state.config.reveal_duration
        );
        Ok(true)
    }

    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.timestamp = timestamp;
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_mint(
        &self,
        currency: String,
        account: String,
        amount: u64,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let currency = parse_address(&currency);
        let account = parse_address(&account);
        state.ledgers.currency.mint(currency, account, amount);
        info!("Minted {} to {}", amount, hex::encode(account));
        Ok(true)
    }

    async fn admin_register_asset(
        &self,
        registry: String,
        asset_id: u64,
        owner: String,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let asset = AssetRef {
            registry: parse_address(&registry),
            asset_id,
        };
        let owner = parse_address(&owner);
        state.ledgers.assets.register(asset, owner);
        info!("Registered asset {} to {}", asset_id, hex::encode(owner));
        Ok(true)
    }

    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender));
        let asset = AssetRef {
            registry: parse_address(&params.asset_registry),
            asset_id: params.asset_id,
        };
        let currency = parse_address(&params.currency);

        let ChainState {
            engine,
            ledgers,
            config,
            ..
        } = &mut *state;
        let auction_id = handlers::handle_create_auction(
            engine,
            ledgers,
            config,
            &ctx,
            asset,
            params.starting_price,
            currency,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to create auction: {}", e)))?;

        info!("Created auction {}", auction_id);
        Ok(auction_id)
    }

    async fn auction_commit_bid(
        &self,
        params: CommitBidParams,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender));
        let salt = parse_salt(&params.salt)?;

        let ChainState {
            engine, ledgers, ..
        } = &mut *state;
        handlers::handle_commit_bid(engine, ledgers, &ctx, params.auction_id, params.amount, salt)
            .map_err(|e| Self::rpc_error(&format!("Failed to commit bid: {}", e)))?;

        info!(
            "Bid committed for auction {} by {}",
            params.auction_id, params.sender
        );
        Ok(true)
    }

    async fn auction_reveal_bid(
        &self,
        params: RevealBidParams,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender));
        let salt = parse_salt(&params.salt)?;

        handlers::handle_reveal_bid(
            &mut state.engine,
            &ctx,
            params.auction_id,
            params.amount,
            salt,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to reveal bid: {}", e)))?;

        info!(
            "Bid revealed for auction {} by {}: {}",
            params.auction_id, params.sender, params.amount
        );
        Ok(true)
    }

    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<FinalizeOutcomeRpc, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&sender));

        let ChainState {
            engine, ledgers, ..
        } = &mut *state;
        let outcome = handlers::handle_finalize_auction(engine, ledgers, &ctx, auction_id)
            .map_err(|e| Self::rpc_error(&format!("Failed to finalize: {}", e)))?;

        info!(
            "Auction {} finalized. Winner: {:?}, bid: {}",
            auction_id,
            outcome.winner.map(hex::encode),
            outcome.winning_bid
        );
        Ok(FinalizeOutcomeRpc {
            winner: outcome.winner.map(hex::encode),
            winning_bid: outcome.winning_bid,
            num_reveals: outcome.num_reveals,
        })
    }

    async fn auction_withdraw_bid(
        &self,
        params: WithdrawBidParams,
    ) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_address(&params.sender));
        let salt = parse_salt(&params.salt)?;

        let ChainState {
            engine, ledgers, ..
        } = &mut *state;
        let refund = handlers::handle_withdraw_unrevealed_bid(
            engine,
            ledgers,
            &ctx,
            params.auction_id,
            params.amount,
            salt,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to withdraw: {}", e)))?;

        info!("Refund of {} claimed by {}", refund, params.sender);
        Ok(refund)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .engine
            .get_auction(auction_id)
            .map(|auction| AuctionRpc::from_auction(auction, state.timestamp)))
    }

    async fn query_get_bid_count(
        &self,
        auction_id: u64,
    ) -> Result<Option<u64>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .engine
            .get_auction(auction_id)
            .map(|auction| auction.bid_count))
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let mut auctions: Vec<&sealbid_types::Auction> = state.engine.auctions.values().collect();
        auctions.sort_by_key(|auction| auction.id);
        Ok(auctions
            .into_iter()
            .map(|auction| AuctionRpc::from_auction(auction, state.timestamp))
            .collect())
    }

    async fn query_list_open_auctions(
        &self,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_open_auctions(&state.engine, state.timestamp)
            .into_iter()
            .map(AuctionSummaryRpc::from)
            .collect())
    }

    async fn query_list_awaiting_finalize(
        &self,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_awaiting_finalize(&state.engine, state.timestamp)
            .into_iter()
            .map(AuctionSummaryRpc::from)
            .collect())
    }

    async fn query_get_revealed_bids(
        &self,
        auction_id: u64,
    ) -> Result<Vec<RevealedBidRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .engine
            .get_reveals(auction_id)
            .iter()
            .map(RevealedBidRpc::from)
            .collect())
    }

    async fn query_get_escrow(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<EscrowRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let bidder = parse_address(&bidder);
        Ok(state
            .engine
            .get_escrow(auction_id, &bidder)
            .copied()
            .map(EscrowRpc::from))
    }

    async fn query_get_events(&self, offset: u64) -> Result<Vec<EventRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .engine
            .events
            .iter()
            .skip(offset as usize)
            .map(EventRpc::from)
            .collect())
    }

    async fn query_get_balance(
        &self,
        currency: String,
        account: String,
    ) -> Result<u64, ErrorObjectOwned> {
        use sealbid_engine::CurrencyLedger;
        let state = self.state.read();
        Ok(state
            .ledgers
            .currency
            .balance_of(parse_address(&currency), parse_address(&account)))
    }

    async fn query_get_asset_owner(
        &self,
        registry: String,
        asset_id: u64,
    ) -> Result<Option<String>, ErrorObjectOwned> {
        use sealbid_engine::AssetCustody;
        let state = self.state.read();
        let asset = AssetRef {
            registry: parse_address(&registry),
            asset_id,
        };
        Ok(state.ledgers.assets.owner_of(&asset).map(hex::encode))
    }
}

fn parse_address(s: &str) -> Address {
    let mut addr = [0u8; 32];
    if let Ok(bytes) = hex::decode(s.trim_start_matches("0x")) {
        let len = bytes.len().min(32);
        addr[..len].copy_from_slice(&bytes[..len]);
    }
    addr
}

fn parse_salt(s: &str) -> Result<Salt, ErrorObjectOwned> {
    let bytes: [u8; 32] = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| AuctionChainServer::rpc_error(&format!("Invalid salt hex: {}", e)))?
        .try_into()
        .map_err(|_| AuctionChainServer::rpc_error("Salt must be 32 bytes"))?;
    Ok(Salt(bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sealbid_server=info".parse().unwrap())
                .add_directive("jsonrpsee=warn".parse().unwrap()),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;

    info!("Starting auction dev server on {}", addr);

    let server = Server::builder().build(addr).await?;
    let handle = server.start(AuctionChainServer::new().into_rpc());

    info!("Auction dev server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
