#[tokio::main]
async fn main() -> std::io::Result<()> {
    rts_client::run_with_config().await
}
