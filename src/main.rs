use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dkchat::cli::run_cli().await
}
