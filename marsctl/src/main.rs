mod cmds;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "marsctl")]
#[command(version)]
#[command(about = "Mars Credit miner supervisor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Geth binary management")]
    Geth {
        #[command(subcommand)]
        command: GethCommands,
    },

    #[command(about = "Wallet and mining-address commands")]
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },

    #[command(about = "Miner lifecycle commands")]
    Miner {
        #[command(subcommand)]
        command: MinerCommands,
    },

    #[command(alias = "network")]
    #[command(about = "JSON-RPC queries against a local or remote node")]
    Net {
        #[command(subcommand)]
        command: NetCommands,
    },
}

#[derive(Subcommand)]
enum GethCommands {
    #[command(about = "Check whether a runnable geth binary is installed")]
    Status(cmds::geth::status::Opts),

    #[command(about = "Download and install the pinned geth release")]
    Download(cmds::geth::download::Opts),

    #[command(about = "Print the resolved geth binary path")]
    Path(cmds::geth::path::Opts),
}

#[derive(Subcommand)]
enum WalletCommands {
    #[command(about = "Generate a new 12-word wallet")]
    Generate(cmds::wallet::generate::Opts),

    #[command(about = "Import a wallet from a BIP39 mnemonic")]
    ImportMnemonic(cmds::wallet::import_mnemonic::Opts),

    #[command(about = "Import a wallet from a raw private key")]
    ImportKey(cmds::wallet::import_key::Opts),

    #[command(about = "Set an address-only mining target")]
    SetAddress(cmds::wallet::set_address::Opts),

    #[command(about = "Show the stored mining address")]
    Address(cmds::wallet::address::Opts),

    #[command(about = "Encrypt and store the mnemonic")]
    SaveMnemonic(cmds::wallet::save_mnemonic::Opts),

    #[command(about = "Decrypt and print the stored mnemonic")]
    LoadMnemonic(cmds::wallet::load_mnemonic::Opts),

    #[command(about = "Write an encrypted keystore into a miner directory")]
    WriteKeystore(cmds::wallet::write_keystore::Opts),

    #[command(about = "Summarize persisted wallet state")]
    Info(cmds::wallet::info::Opts),
}

#[derive(Subcommand)]
enum MinerCommands {
    #[command(about = "Run the supervisor with one or more miner tabs in the foreground")]
    Run(cmds::miner::run::Opts),

    #[command(about = "Stop a miner by its PID file")]
    Stop(cmds::miner::stop::Opts),

    #[command(about = "List running miners")]
    Ps(cmds::miner::ps::Opts),

    #[command(about = "Stop every running miner")]
    Killall(cmds::miner::killall::Opts),

    #[command(about = "Tail a miner's log file")]
    Logs(cmds::miner::logs::Opts),
}

#[derive(Subcommand)]
enum NetCommands {
    #[command(about = "Balance of an address, falling back to the remote endpoint")]
    Balance(cmds::net::balance::Opts),

    #[command(about = "Peer count")]
    Peers(cmds::net::peers::Opts),

    #[command(about = "Sync status")]
    Syncing(cmds::net::syncing::Opts),

    #[command(about = "Whether the node is mining")]
    Mining(cmds::net::mining::Opts),

    #[command(about = "Reported hashrate")]
    Hashrate(cmds::net::hashrate::Opts),

    #[command(about = "Latest block number")]
    BlockNumber(cmds::net::block_number::Opts),

    #[command(about = "Point block rewards at an address")]
    SetEtherbase(cmds::net::set_etherbase::Opts),

    #[command(about = "Start mining via RPC")]
    MinerStart(cmds::net::miner_start::Opts),

    #[command(about = "Stop mining via RPC")]
    MinerStop(cmds::net::miner_stop::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Geth { command } => match command {
            GethCommands::Status(opts) => cmds::geth::status::run(opts).await?,
            GethCommands::Download(opts) => cmds::geth::download::run(opts).await?,
            GethCommands::Path(opts) => cmds::geth::path::run(opts).await?,
        },
        Commands::Wallet { command } => match command {
            WalletCommands::Generate(opts) => cmds::wallet::generate::run(opts).await?,
            WalletCommands::ImportMnemonic(opts) => cmds::wallet::import_mnemonic::run(opts).await?,
            WalletCommands::ImportKey(opts) => cmds::wallet::import_key::run(opts).await?,
            WalletCommands::SetAddress(opts) => cmds::wallet::set_address::run(opts).await?,
            WalletCommands::Address(opts) => cmds::wallet::address::run(opts).await?,
            WalletCommands::SaveMnemonic(opts) => cmds::wallet::save_mnemonic::run(opts).await?,
            WalletCommands::LoadMnemonic(opts) => cmds::wallet::load_mnemonic::run(opts).await?,
            WalletCommands::WriteKeystore(opts) => cmds::wallet::write_keystore::run(opts).await?,
            WalletCommands::Info(opts) => cmds::wallet::info::run(opts).await?,
        },
        Commands::Miner { command } => match command {
            MinerCommands::Run(opts) => cmds::miner::run::run(opts).await?,
            MinerCommands::Stop(opts) => cmds::miner::stop::run(opts).await?,
            MinerCommands::Ps(opts) => cmds::miner::ps::run(opts).await?,
            MinerCommands::Killall(opts) => cmds::miner::killall::run(opts).await?,
            MinerCommands::Logs(opts) => cmds::miner::logs::run(opts).await?,
        },
        Commands::Net { command } => match command {
            NetCommands::Balance(opts) => cmds::net::balance::run(opts).await?,
            NetCommands::Peers(opts) => cmds::net::peers::run(opts).await?,
            NetCommands::Syncing(opts) => cmds::net::syncing::run(opts).await?,
            NetCommands::Mining(opts) => cmds::net::mining::run(opts).await?,
            NetCommands::Hashrate(opts) => cmds::net::hashrate::run(opts).await?,
            NetCommands::BlockNumber(opts) => cmds::net::block_number::run(opts).await?,
            NetCommands::SetEtherbase(opts) => cmds::net::set_etherbase::run(opts).await?,
            NetCommands::MinerStart(opts) => cmds::net::miner_start::run(opts).await?,
            NetCommands::MinerStop(opts) => cmds::net::miner_stop::run(opts).await?,
        },
    }

    Ok(())
}
