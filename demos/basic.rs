use alerts_http::{Alert, AlertClient, RequestContext, Severity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = AlertClient::from_env().map_err(anyhow::Error::msg)?;
    let ctx = RequestContext::background();

    client.connect(&ctx).await?;

    let alert = Alert::new("Disk almost full", "/var is at 93% on db-01")
        .with_severity(Severity::Warning)
        .with_correlation_id("db-01-disk-var");
    client.send(&ctx, &[alert]).await?;

    client.close();
    Ok(())
}
