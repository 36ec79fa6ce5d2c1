use clap::{Parser, Subcommand};

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Parser, Debug)]
#[command(name = "hospital-directory")]
#[command(about = "Hospital directory backend (DuckDB + axum)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the DuckDB schema and load hospitals and treatments from a JSON seed file.
    Seed(SeedArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    /// Backend data directory (holds the DuckDB file).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Seed file to load. Defaults to <data-dir>/seed.json.
    #[arg(long)]
    pub file: Option<String>,

    /// Wipe existing hospitals and treatments before loading.
    #[arg(long)]
    pub rebuild: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Backend data directory (holds the DuckDB file).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    /// Serve from an in-process store instead of DuckDB. Data is lost on exit.
    #[arg(long)]
    pub memory: bool,

    /// With --memory, load this seed file at startup.
    #[arg(long, requires = "memory")]
    pub seed_file: Option<String>,
}
