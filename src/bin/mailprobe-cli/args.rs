use clap::{Parser, Subcommand, ValueEnum};
use mailprobe_lib::MxStrategy;

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "SMTP deliverability probe")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// output format
    #[arg(long, value_enum, default_value_t = Format::Human, global = true)]
    pub format: Format,
}

#[derive(Subcommand)]
pub enum Commands {
    /// probe a mailbox over SMTP
    Check(CheckArgs),
    /// resolve the MX records of a domain
    Mx { domain: String },
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// address to probe
    pub email: String,

    #[arg(long, value_enum, default_value_t = StrategyArg::FirstConnected)]
    pub strategy: StrategyArg,

    /// socks5://[user:pass@]host:port[?timeout=5s]
    #[arg(long)]
    pub proxy: Option<String>,

    /// MAIL FROM address
    #[arg(long = "from")]
    pub from_email: Option<String>,

    /// EHLO/HELO name
    #[arg(long)]
    pub helo: Option<String>,

    #[arg(long, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// per-command read/write timeout
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = 25)]
    pub port: u16,

    /// skip the catch-all probe
    #[arg(long)]
    pub no_catch_all: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    FirstConnected,
    Priority,
}

impl From<StrategyArg> for MxStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstConnected => MxStrategy::FirstConnected,
            StrategyArg::Priority => MxStrategy::Priority,
        }
    }
}
