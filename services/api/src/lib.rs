mod cli;
mod gemini;
mod infra;
mod report;
mod routes;
mod server;
mod settings;

use hr_review::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
