use clap::{Parser, Subcommand};
use nestegg::api::{ProjectArgs, render_projection, run_http_server};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Month-by-month investment growth projection (contributions, yearly raise, December top-up)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web form and the JSON projection API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print a projection table to stdout.
    Project {
        #[command(flatten)]
        args: ProjectArgs,
        #[arg(long, help = "Emit the records as JSON instead of a table")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Project { args, json } => match render_projection(args, json) {
            Ok(output) => println!("{output}"),
            Err(msg) => {
                eprintln!("error: {msg}");
                std::process::exit(2);
            }
        },
    }
    Ok(())
}
