mod cli;
mod infra;
mod routes;
mod server;
mod terms;

use quark::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
