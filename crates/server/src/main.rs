//! Taskboard server entrypoint

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run().await
}
