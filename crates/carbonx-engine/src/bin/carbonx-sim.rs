//! CarbonX exchange simulation.
//!
//! Replays a command script through the exchange service and prints one
//! JSON line per step, followed by a balance and book summary.
//!
//! Usage:
//!   carbonx-sim                       # built-in walkthrough
//!   carbonx-sim script.json           # replay a script
//!   carbonx-sim --config engine.json --json-logs script.json

use std::path::PathBuf;

use carbonx_custody::AllowAll;
use carbonx_engine::script::{self, ScriptStep};
use carbonx_engine::{Engine, ExchangeService, TradeJournal};
use carbonx_matchcore::DepthLevel;
use carbonx_types::{
    AccountId, Asset, Balance, Command, EngineConfig, Receipt, Result, Side, constants,
};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carbonx-sim")]
#[command(version, about = "Replay a command script through the CarbonX exchange")]
struct Cli {
    /// JSON script of `{caller, command}` steps. Runs the built-in
    /// walkthrough when omitted.
    script: Option<PathBuf>,

    /// Engine config (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,

    /// Price levels per side in the summary.
    #[arg(long, default_value_t = constants::DEFAULT_DEPTH_LEVELS)]
    depth: usize,
}

#[derive(Serialize)]
struct StepLine<'a> {
    step: usize,
    caller: &'a AccountId,
    command: &'a Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<&'a Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct AccountLine {
    account: AccountId,
    currency: Balance,
    commodity: Balance,
}

#[derive(Serialize)]
struct Summary {
    market: String,
    executed: usize,
    rejected: usize,
    accounts: Vec<AccountLine>,
    bids: Vec<DepthLevel>,
    asks: Vec<DepthLevel>,
    journal_events: usize,
    journal_head: String,
    journal_verified: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    init_tracing(&config.log_filter, cli.json_logs);

    let steps = match &cli.script {
        Some(path) => script::load_script(path)?,
        None => script::walkthrough(),
    };
    info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        steps = steps.len(),
        "starting simulation"
    );

    let market = config.market.symbol();
    let engine = Engine::new(config, Box::new(AllowAll), TradeJournal::new())?;
    let (handle, worker) = ExchangeService::spawn(engine);

    let mut executed = 0;
    let mut rejected = 0;
    for (step, ScriptStep { caller, command }) in steps.iter().enumerate() {
        let result = handle.execute(caller.clone(), command.clone()).await;
        let line = match &result {
            Ok(receipt) => {
                executed += 1;
                StepLine {
                    step,
                    caller,
                    command,
                    receipt: Some(receipt),
                    error: None,
                }
            }
            Err(err) => {
                rejected += 1;
                StepLine {
                    step,
                    caller,
                    command,
                    receipt: None,
                    error: Some(err.to_string()),
                }
            }
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    drop(handle);
    let engine = worker
        .await
        .map_err(|_| carbonx_types::CarbonxError::ServiceUnavailable)?;

    let journal = engine.sink();
    let summary = Summary {
        market,
        executed,
        rejected,
        accounts: engine
            .ledger()
            .accounts()
            .into_iter()
            .map(|account| AccountLine {
                currency: engine.balance(&account, Asset::Currency),
                commodity: engine.balance(&account, Asset::Commodity),
                account,
            })
            .collect(),
        bids: engine.depth(Side::Bid, cli.depth),
        asks: engine.depth(Side::Ask, cli.depth),
        journal_events: journal.len(),
        journal_head: journal.head_hex(),
        journal_verified: journal.verify(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
