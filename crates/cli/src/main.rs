//! CLI for interacting with commit-reveal sealed-bid auctions.
//!
//! This binary provides commands for:
//! - Creating auctions
//! - Committing sealed bids (with locally generated salts)
//! - Revealing bids after the bidding window
//! - Finalizing auctions and withdrawing deposits

use anyhow::Result;
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use sealbid_cli::{parse_salt, prepare_bid, prepare_bid_with_salt};

#[derive(Parser)]
#[command(name = "sealbid-cli")]
#[command(about = "CLI for commit-reveal sealed-bid auctions")]
struct Cli {
    /// Dev server RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new auction
    CreateAuction {
        /// Seller address (hex)
        #[arg(long)]
        sender: String,

        /// Asset registry address (hex)
        #[arg(long)]
        asset_registry: String,

        /// Asset id within the registry
        #[arg(long)]
        asset_id: u64,

        /// Minimum acceptable bid
        #[arg(long)]
        starting_price: u64,

        /// Settlement currency address (hex)
        #[arg(long)]
        currency: String,
    },

    /// Commit a sealed bid (escrows the amount)
    Commit {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bid amount (escrowed at commit time)
        #[arg(long)]
        amount: u64,

        /// Reveal salt (32-byte hex); generated and printed if omitted
        #[arg(long)]
        salt: Option<String>,
    },

    /// Reveal a previously committed bid
    Reveal {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// The committed bid amount
        #[arg(long)]
        amount: u64,

        /// The salt used at commit time (32-byte hex)
        #[arg(long)]
        salt: String,
    },

    /// Finalize an auction (anyone can call this)
    Finalize {
        /// Caller address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Withdraw an unrevealed or losing deposit
    Withdraw {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// The committed bid amount
        #[arg(long)]
        amount: u64,

        /// The salt used at commit time (32-byte hex)
        #[arg(long)]
        salt: String,
    },

    /// Get auction details
    GetAuction {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// List all auctions
    ListAuctions,

    /// Number of commits an auction has received
    GetBidCount {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Revealed bids for an auction, in reveal order
    GetReveals {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// A bidder's escrow entry for an auction
    GetEscrow {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bidder address (hex)
        #[arg(long)]
        bidder: String,
    },

    /// Balance on the dev server's currency ledger
    GetBalance {
        /// Currency address (hex)
        #[arg(long)]
        currency: String,

        /// Account address (hex)
        #[arg(long)]
        account: String,
    },

    /// Mint funds on the dev server's currency ledger (testing)
    Mint {
        /// Currency address (hex)
        #[arg(long)]
        currency: String,

        /// Account address (hex)
        #[arg(long)]
        account: String,

        /// Amount to mint
        #[arg(long)]
        amount: u64,
    },

    /// Register an asset on the dev server's registry (testing)
    RegisterAsset {
        /// Registry address (hex)
        #[arg(long)]
        registry: String,

        /// Asset id
        #[arg(long)]
        asset_id: u64,

        /// Initial owner address (hex)
        #[arg(long)]
        owner: String,
    },

    /// Advance chain time (for testing)
    AdvanceBlock,

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionRpc {
    id: u64,
    seller: String,
    asset_registry: String,
    asset_id: u64,
    starting_price: u64,
    currency: String,
    highest_bid: u64,
    highest_bidder: Option<String>,
    is_finalized: bool,
    phase: String,
    created_at: u64,
    bidding_deadline: u64,
    reveal_deadline: u64,
    bid_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevealedBidRpc {
    bidder: String,
    amount: u64,
    revealed_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EscrowRpc {
    deposited: u64,
    refunded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct FinalizeOutcomeRpc {
    winner: Option<String>,
    winning_bid: u64,
    num_reveals: u64,
}

async fn commit_cmd(
    client: &HttpClient,
    sender: &str,
    auction_id: u64,
    amount: u64,
    salt: Option<String>,
) -> Result<()> {
    let prepared = match salt {
        Some(s) => prepare_bid_with_salt(auction_id, amount, parse_salt(&s)?)?,
        None => prepare_bid(auction_id, amount, &mut OsRng),
    };

    let params = serde_json::json!({
        "sender": sender,
        "auction_id": auction_id,
        "amount": amount,
        "salt": hex::encode(prepared.salt.0),
    });

    let _result: bool = client.request("auction_commitBid", vec![params]).await?;

    info!("Bid committed for auction {}", auction_id);
    println!("Bid committed successfully");
    println!("  Auction ID: {}", auction_id);
    println!("  Amount: {} (escrowed)", amount);
    println!("  Salt: {}", hex::encode(prepared.salt.0));
    println!("  Commitment: {}", hex::encode(prepared.sealed_hash.0));
    println!("Keep the amount and salt: both are needed to reveal.");

    Ok(())
}

async fn get_auction_cmd(client: &HttpClient, auction_id: u64) -> Result<()> {
    let auction: Option<AuctionRpc> = client
        .request("query_getAuction", vec![auction_id])
        .await?;

    match auction {
        Some(a) => {
            println!("Auction {}:", a.id);
            println!("  Phase: {}", a.phase);
            println!("  Seller: {}", a.seller);
            println!("  Asset: {} / {}", a.asset_registry, a.asset_id);
            println!("  Starting price: {}", a.starting_price);
            println!("  Bidding deadline: {}", a.bidding_deadline);
            println!("  Reveal deadline: {}", a.reveal_deadline);
            println!("  Commits: {}", a.bid_count);
            if let Some(bidder) = a.highest_bidder {
                println!("  Highest: {} by {}", a.highest_bid, bidder);
            }
        }
        None => {
            println!("Auction {} not found", auction_id);
        }
    }

    Ok(())
}

async fn list_auctions_cmd(client: &HttpClient) -> Result<()> {
    let auctions: Vec<AuctionRpc> =
        client.request("query_listAuctions", Vec::<()>::new()).await?;

    if auctions.is_empty() {
        println!("No auctions found");
    } else {
        println!("Auctions:");
        for a in auctions {
            println!(
                "  [{}] {} - starting {} ({} commits)",
                a.id, a.phase, a.starting_price, a.bid_count
            );
        }
    }

    Ok(())
}

async fn get_reveals_cmd(client: &HttpClient, auction_id: u64) -> Result<()> {
    let reveals: Vec<RevealedBidRpc> = client
        .request("query_getRevealedBids", vec![auction_id])
        .await?;

    if reveals.is_empty() {
        println!("No revealed bids for auction {}", auction_id);
    } else {
        println!("Revealed bids for auction {}:", auction_id);
        for (i, bid) in reveals.iter().enumerate() {
            println!(
                "  [{}] {} bid {} at t={}",
                i, bid.bidder, bid.amount, bid.revealed_at
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sealbid_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::CreateAuction {
            sender,
            asset_registry,
            asset_id,
            starting_price,
            currency,
        } => {
            let params = serde_json::json!({
                "sender": sender,
                "asset_registry": asset_registry,
                "asset_id": asset_id,
                "starting_price": starting_price,
                "currency": currency,
            });
            let auction_id: u64 = client.request("auction_create", vec![params]).await?;
            info!("Created auction with ID: {}", auction_id);
            println!("Auction ID: {}", auction_id);
        }

        Commands::Commit {
            sender,
            auction_id,
            amount,
            salt,
        } => {
            commit_cmd(&client, &sender, auction_id, amount, salt).await?;
        }

        Commands::Reveal {
            sender,
            auction_id,
            amount,
            salt,
        } => {
            // Parse locally first so a malformed salt fails before the call
            let salt = parse_salt(&salt)?;
            let params = serde_json::json!({
                "sender": sender,
                "auction_id": auction_id,
                "amount": amount,
                "salt": hex::encode(salt.0),
            });
            let _result: bool = client.request("auction_revealBid", vec![params]).await?;
            println!("Bid revealed: auction {}, amount {}", auction_id, amount);
        }

        Commands::Finalize { sender, auction_id } => {
            let outcome: FinalizeOutcomeRpc = client
                .request("auction_finalize", (sender, auction_id))
                .await?;
            println!("Auction {} finalized", auction_id);
            match outcome.winner {
                Some(winner) => {
                    println!("  Winner: {}", winner);
                    println!("  Winning bid: {}", outcome.winning_bid);
                }
                None => println!("  No bids were revealed; asset stays in custody"),
            }
            println!("  Reveals: {}", outcome.num_reveals);
        }

        Commands::Withdraw {
            sender,
            auction_id,
            amount,
            salt,
        } => {
            let salt = parse_salt(&salt)?;
            let params = serde_json::json!({
                "sender": sender,
                "auction_id": auction_id,
                "amount": amount,
                "salt": hex::encode(salt.0),
            });
            let refund: u64 = client.request("auction_withdrawBid", vec![params]).await?;
            println!("Refunded {} for auction {}", refund, auction_id);
        }

        Commands::GetAuction { auction_id } => {
            get_auction_cmd(&client, auction_id).await?;
        }

        Commands::ListAuctions => {
            list_auctions_cmd(&client).await?;
        }

        Commands::GetBidCount { auction_id } => {
            let count: Option<u64> = client
                .request("query_getBidCount", vec![auction_id])
                .await?;
            match count {
                Some(count) => println!("Auction {} has {} commits", auction_id, count),
                None => println!("Auction {} not found", auction_id),
            }
        }

        Commands::GetReveals { auction_id } => {
            get_reveals_cmd(&client, auction_id).await?;
        }

        Commands::GetEscrow { auction_id, bidder } => {
            let escrow: Option<EscrowRpc> = client
                .request("query_getEscrow", (auction_id, bidder))
                .await?;
            match escrow {
                Some(entry) => {
                    println!("Deposited: {}", entry.deposited);
                    println!("Refunded: {}", entry.refunded);
                }
                None => println!("No escrow entry"),
            }
        }

        Commands::GetBalance { currency, account } => {
            let balance: u64 = client
                .request("query_getBalance", (currency, account))
                .await?;
            println!("Balance: {}", balance);
        }

        Commands::Mint {
            currency,
            account,
            amount,
        } => {
            let _: bool = client
                .request("admin_mint", (currency, account, amount))
                .await?;
            println!("Minted {}", amount);
        }

        Commands::RegisterAsset {
            registry,
            asset_id,
            owner,
        } => {
            let _: bool = client
                .request("admin_registerAsset", (registry, asset_id, owner))
                .await?;
            println!("Asset {} registered", asset_id);
        }

        Commands::AdvanceBlock => {
            let block: BlockInfo = client.request("admin_advanceBlock", Vec::<()>::new()).await?;
            println!(
                "Block advanced: height={}, timestamp={}",
                block.height, block.timestamp
            );
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client.request("admin_setTimestamp", vec![timestamp]).await?;
            println!("Timestamp set to {}", timestamp);
        }
    }

    Ok(())
}
