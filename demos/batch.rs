use std::time::Duration;

use alerts_http::{Alert, AlertClient, ClientOptions, RequestContext, Severity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("ALERTS_API_URL")?;
    let token = std::env::var("ALERTS_API_TOKEN")?;

    let options = ClientOptions::default()
        .with_auth_token(token)
        .with_retry_count(5)
        .with_retry_wait(Duration::from_millis(250))
        .with_retry_max_wait(Duration::from_secs(10))
        .with_request_header("X-Source", "batch-demo");
    let client = AlertClient::new(url, options);

    let ctx = RequestContext::background().with_timeout(Duration::from_secs(60));
    client.connect(&ctx).await?;

    let alerts: Vec<Alert> = (1..=3)
        .map(|n| {
            Alert::new(format!("Job {n} failed"), format!("nightly job {n} exited with 1"))
                .with_severity(Severity::Error)
                .with_route_key("nightly-jobs")
        })
        .collect();

    let metadata = client.send_with_response(&ctx, &alerts).await?;
    println!("status {} in {:?}", metadata.status, metadata.duration);

    client.close();
    Ok(())
}
