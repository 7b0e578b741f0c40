use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/funnel.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted funnel snapshot, if any.
    Show,
    /// Delete the persisted funnel snapshot.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Show => match storage.load_funnel_state().await? {
            Some(state) => {
                println!("{}", serde_json::to_string_pretty(&state)?);
                if let Some(saved_at) = storage.last_saved_at().await? {
                    println!("last saved at {saved_at}");
                }
            }
            None => println!("no saved funnel state"),
        },
        Command::Reset => {
            storage.clear_funnel_state().await?;
            println!("cleared saved funnel state");
        }
    }

    Ok(())
}
