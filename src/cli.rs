use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use pixelq::config::Config;

#[derive(Parser, Debug)]
#[command(name = "pixelq")]
#[command(about = "Distributed image pipeline with lease-based task scheduling", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides PIXELQ_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the service directory
    Directory(ServerArgs),
    /// Run the task ledger
    Ledger(RoleArgs),
    /// Run the blob store
    Storage(RoleArgs),
    /// Run the coordinator
    Coordinator(RoleArgs),
    /// Run a worker pool
    Worker(WorkerArgs),
    /// Run the upload gateway
    Gateway(RoleArgs),
    /// Run every role in one process, in memory
    Standalone(StandaloneArgs),
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct RoleArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Address published in the service directory
    #[arg(long)]
    pub advertise: Option<String>,

    /// Service directory address
    #[arg(long)]
    pub directory: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct WorkerArgs {
    /// Service directory address
    #[arg(long)]
    pub directory: Option<String>,

    /// Number of worker loops
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct StandaloneArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Number of worker loops
    #[arg(long)]
    pub workers: Option<usize>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(address) = self.address {
            config.server.bind_addr = address;
        }
    }
}

impl RoleArgs {
    pub fn apply(&self, config: &mut Config) {
        self.server.apply(config);
        if let Some(advertise) = &self.advertise {
            config.server.advertise_addr = Some(advertise.clone());
        }
        if let Some(directory) = &self.directory {
            config.directory.address = directory.clone();
        }
    }
}

impl WorkerArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(directory) = &self.directory {
            config.directory.address = directory.clone();
        }
        if let Some(workers) = self.workers {
            config.worker.count = workers;
        }
    }
}

impl StandaloneArgs {
    pub fn apply(&self, config: &mut Config) {
        self.server.apply(config);
        if let Some(workers) = self.workers {
            config.worker.count = workers;
        }
    }
}
