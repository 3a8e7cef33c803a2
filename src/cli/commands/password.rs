use clap::Subcommand;
use serde_json::json;

use crate::auth::{hash_password, DEFAULT_COST};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Print a bcrypt hash suitable for the users.password column")]
    Hash {
        #[arg(help = "Plain-text password")]
        password: String,
        #[arg(long, default_value_t = DEFAULT_COST, help = "bcrypt cost factor (4-31)")]
        cost: u32,
    },
}

pub fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password, cost } => {
            let hash = hash_password(&password, cost)?;
            output_success(&output_format, "Password hashed", Some(json!({ "hash": hash })))
        }
    }
}
