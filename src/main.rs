//! lesionscan CLI - Main entry point.

use lesionscan::auth::hash_password;
use lesionscan::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let mut config = cli.load_config()?;

    match cli.into_command() {
        Commands::Serve(args) => {
            args.apply(&mut config);

            // Run the server
            lesionscan::run(config).await?;
        }

        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password));
        }
    }

    Ok(())
}
