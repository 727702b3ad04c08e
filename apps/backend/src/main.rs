#[tokio::main]
async fn main() -> anyhow::Result<()> {
    academy_backend::run().await
}
