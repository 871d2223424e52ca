#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reading_drill::run().await
}
