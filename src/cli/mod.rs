pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jmxgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query runtime management data across a fleet of workers", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to the YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value = "admin", help = "Caller user id")]
    pub user: String,

    #[arg(short, long = "role", global = true, help = "Caller role (repeatable)")]
    pub roles: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run one management query and print the JSON response")]
    Query {
        #[arg(help = "list-mbeans, mbean-info, mbean-attribute, all-mbean-attributes or all-executor-attributes")]
        command: String,

        #[arg(short, long, help = "Management object name (domain:key=value,...)")]
        mbean: Option<String>,

        #[arg(short, long, help = "Attribute name")]
        attribute: Option<String>,

        #[arg(long = "host-port", help = "Worker host:port, or '*' for every worker")]
        host_port: Option<String>,
    },
    #[command(about = "Print local and per-worker object listings")]
    Overview,
}
