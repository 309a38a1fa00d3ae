mod cli;
mod infra;
mod routes;
mod server;
mod simulate;

use memory_navigator::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
