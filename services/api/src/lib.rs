mod cli;
mod infra;
mod routes;
mod server;

use estate_market::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
