use clap::Parser;
use depot::RegistryConfig;
use std::path::PathBuf;

/// Run a pool registry command file
#[derive(Parser)]
#[command(about, long_about, version)]
pub struct Cli {
    #[arg(help = "Command file, one command per line", value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    #[arg(
        short,
        long,
        help = "Write results here instead of stdout",
        value_hint = clap::ValueHint::FilePath
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Log filter directives, overrides RUST_LOG")]
    pub log_level: Option<String>,

    #[arg(
        long,
        help = "Units to pre-allocate",
        env = "DEPOT_UNIT_CAPACITY",
        default_value_t = RegistryConfig::DEFAULT_UNIT_CAPACITY
    )]
    pub unit_capacity: usize,

    #[arg(
        long,
        help = "Pools to pre-allocate",
        env = "DEPOT_POOL_CAPACITY",
        default_value_t = RegistryConfig::DEFAULT_POOL_CAPACITY
    )]
    pub pool_capacity: usize,
}

impl Cli {
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_unit_capacity(self.unit_capacity)
            .with_pool_capacity(self.pool_capacity)
    }
}
