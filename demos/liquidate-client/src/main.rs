use core::str::FromStr;
use std::process::ExitCode;

use lending_client::account::find_largest_token_account_for_owner;
use lending_client::instruction::{
    self, LiquidateAccounts, LiquidateObligation, StakingAccounts,
    LENDING_PROGRAM_ID,
};
use lending_client::notify::notify;
use lending_client::send::send_transaction;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::signer::keypair::Keypair;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;


/// RPC endpoint used when `RPC_URL` is not set.
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";


type Result<T = (), E = Error> = core::result::Result<T, E>;


/// Command line arguments.
struct Args {
    liquidity_amount: u64,
    repay_mint: Pubkey,
    collateral_mint: Pubkey,
    repay_reserve: Pubkey,
    repay_reserve_liquidity_supply: Pubkey,
    withdraw_reserve: Pubkey,
    withdraw_reserve_collateral_supply: Pubkey,
    obligation: Pubkey,
    lending_market: Pubkey,
    staking: Option<StakingAccounts>,
}


#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}


/// Executes the program.
async fn run() -> Result {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let keypair = read_keypair()?;
    let url = std::env::var("RPC_URL")
        .unwrap_or_else(|_| DEFAULT_RPC_URL.to_owned());
    let client =
        RpcClient::new_with_commitment(url, CommitmentConfig::confirmed());

    let sig = liquidate(&client, &keypair, &args).await?;
    let message = format!(
        "Liquidated {} from obligation {}: {sig}",
        args.liquidity_amount, args.obligation
    );
    let delivery = notify(&message);
    print_logs(&client, &sig).await?;
    if let Some(delivery) = delivery {
        // Delivery errors are logged by the task itself.
        let _ = delivery.await;
    }
    Ok(())
}


/// Parses the command line arguments.
///
/// Everything is validated here so that bad input fails before any request
/// is sent to the RPC node.
fn parse_args(args: Vec<String>) -> Result<Args> {
    if !(9..=11).contains(&args.len()) {
        return Err(Error::Usage);
    }
    let key = |idx: usize| Pubkey::from_str(&args[idx]);
    let opt_key = |idx: usize| args.get(idx).map(|arg| Pubkey::from_str(arg));
    Ok(Args {
        liquidity_amount: instruction::parse_liquidity_amount(&args[0])?,
        repay_mint: key(1)?,
        collateral_mint: key(2)?,
        repay_reserve: key(3)?,
        repay_reserve_liquidity_supply: key(4)?,
        withdraw_reserve: key(5)?,
        withdraw_reserve_collateral_supply: key(6)?,
        obligation: key(7)?,
        lending_market: key(8)?,
        staking: StakingAccounts::from_options(
            opt_key(9).transpose()?,
            opt_key(10).transpose()?,
        )?,
    })
}


/// Reads keypair from a hard-coded location.
fn read_keypair() -> Result<Keypair> {
    let home = std::env::var_os("HOME").ok_or(Error::Msg("HOME not set"))?;
    let mut path = std::path::PathBuf::from(home);
    path.push(".config/solana/id.json");
    solana_sdk::signer::keypair::read_keypair_file(path)
        .map_err(Error::from)
}


/// Resolves token accounts and sends the liquidation transaction.
async fn liquidate(
    client: &RpcClient,
    keypair: &Keypair,
    args: &Args,
) -> Result<Signature> {
    let source =
        find_largest_token_account_for_owner(client, keypair, &args.repay_mint)
            .await?;
    eprintln!(
        "Source liquidity: {} ({} tokens)",
        source.pubkey, source.account.amount
    );
    if source.account.amount < args.liquidity_amount {
        return Err(Error::Msg("Not enough liquidity to repay"));
    }
    let destination = find_largest_token_account_for_owner(
        client,
        keypair,
        &args.collateral_mint,
    )
    .await?;
    eprintln!("Destination collateral: {}", destination.pubkey);

    let accounts = LiquidateAccounts {
        source_liquidity: source.pubkey,
        destination_collateral: destination.pubkey,
        repay_reserve: args.repay_reserve,
        repay_reserve_liquidity_supply: args.repay_reserve_liquidity_supply,
        withdraw_reserve: args.withdraw_reserve,
        withdraw_reserve_collateral_supply: args
            .withdraw_reserve_collateral_supply,
        obligation: args.obligation,
        lending_market: args.lending_market,
        lending_market_authority: instruction::lending_market_authority(
            &args.lending_market,
            &LENDING_PROGRAM_ID,
        ),
        transfer_authority: keypair.pubkey(),
    };
    let ix = LiquidateObligation {
        liquidity_amount: args.liquidity_amount,
        accounts,
        staking: args.staking,
    }
    .instruction(LENDING_PROGRAM_ID);

    eprintln!("Sending transaction to {}…", ix.program_id);
    let sig = send_transaction(client, keypair, &[ix], &[], true).await?;
    eprintln!("Signature: {sig}");
    Ok(sig)
}


/// Prints log messages of an executed transaction.
async fn print_logs(client: &RpcClient, sig: &Signature) -> Result {
    let encoding = UiTransactionEncoding::Binary;
    let resp = client.get_transaction(sig, encoding).await?;
    let (slot, tx) = (resp.slot, resp.transaction);
    eprintln!("Executed in slot: {slot}");

    let log_messages = tx
        .meta
        .map(|meta| meta.log_messages)
        .ok_or(Error::Msg("No transaction metadata"))?;
    if let OptionSerializer::Some(messages) = log_messages {
        for msg in messages {
            println!("{msg}");
        }
        Ok(())
    } else {
        Err(Error::Msg("No log message"))
    }
}


#[derive(Debug, derive_more::From, derive_more::Display)]
enum Error {
    #[display(
        "usage: liquidate-client <amount> <repay-mint> <collateral-mint> \
         <repay-reserve> <repay-reserve-liquidity-supply> <withdraw-reserve> \
         <withdraw-reserve-collateral-supply> <obligation> <lending-market> \
         [<staking-pool> <stake-account>]"
    )]
    #[from(ignore)]
    Usage,
    Msg(&'static str),
    Client(solana_client::client_error::ClientError),
    Lending(lending_client::Error),
    Pubkey(ParsePubkeyError),
    Box(Box<dyn std::error::Error>),
}
