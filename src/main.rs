use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    region_capture::cli::run().await
}
