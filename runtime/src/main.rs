//! eventrouter binary

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eventrouter_runtime::run().await
}
