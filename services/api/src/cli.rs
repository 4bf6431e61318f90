use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_market::error::AppError;
use estate_market::listings::locations;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Market",
    about = "Run the property listing marketplace from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the known districts, or the sub-districts of one district
    Districts(DistrictArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DistrictArgs {
    /// District whose sub-districts to list
    pub(crate) district: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Districts(args) => {
            for line in district_lines(&args) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn district_lines(args: &DistrictArgs) -> Vec<String> {
    match args.district.as_deref() {
        Some(district) => locations::sub_districts(district)
            .iter()
            .map(|name| name.to_string())
            .collect(),
        None => locations::districts().map(str::to_string).collect(),
    }
}
