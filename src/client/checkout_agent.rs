use anyhow::{bail, Context, Result};
use chrono::Utc;
use trip_checkout::{
    client::{CheckoutClient, GatewaySimulator},
    config::GatewayCredentials,
    models::PrepareRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load configuration
    dotenvy::dotenv().ok();

    let base_url = std::env::var("TRIP_CHECKOUT_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let credentials = GatewayCredentials {
        client_key: std::env::var("NICEPAY_CLIENT_KEY").context("NICEPAY_CLIENT_KEY required")?,
        secret_key: std::env::var("NICEPAY_SECRET_KEY").context("NICEPAY_SECRET_KEY required")?,
    };
    let amount: u64 = std::env::var("AGENT_AMOUNT")
        .unwrap_or_else(|_| "1000".to_string())
        .parse()
        .context("Invalid AGENT_AMOUNT")?;

    println!("trip-checkout Agent");
    println!("===================");
    println!("Server: {}", base_url);
    println!();

    let client = CheckoutClient::new(&base_url);
    let gateway = GatewaySimulator::new(&credentials)?;
    let order_id = format!("TRIP_{}", Utc::now().timestamp_millis());

    println!("Step 1: Preparing order {} for {}...", order_id, amount);
    let prepared = client
        .prepare(&PrepareRequest {
            amount,
            order_id: order_id.clone(),
            order_name: "Agent test trip".to_string(),
            customer_name: "Agent".to_string(),
            customer_email: "agent@example.com".to_string(),
            customer_tel: "01000000000".to_string(),
        })
        .await?;

    if prepared.client_key != credentials.client_key {
        bail!(
            "Server answered with client key {}, expected {}",
            prepared.client_key,
            credentials.client_key
        );
    }
    println!("   [OK] signature {} at {}", prepared.signature, prepared.timestamp);
    println!();

    println!("Step 2: Delivering signed gateway callback...");
    let callback = gateway.callback(&order_id, amount, prepared.timestamp, "0000", "정상 처리되었습니다.");
    if callback.signature != prepared.signature {
        bail!("Gateway signature does not match prepared signature; check NICEPAY_SECRET_KEY");
    }
    let outcome = client.complete(&callback).await?;
    println!("   {}", serde_json::to_string(&outcome)?);
    if !outcome.success {
        bail!("Expected success outcome");
    }
    println!();

    println!("Step 3: Replaying the same callback...");
    let replay = client.complete(&callback).await?;
    println!("   {}", serde_json::to_string(&replay)?);
    if replay != outcome {
        bail!("Replay changed the outcome");
    }
    println!();

    println!("Step 4: Sending a tampered callback (expecting error)...");
    let mut tampered = callback.clone();
    tampered.amount += 1;
    match client.complete(&tampered).await {
        Ok(outcome) => bail!("Tampered callback was accepted: {:?}", outcome),
        Err(e) => println!("   [OK] rejected: {}", e),
    }

    println!();
    println!("[SUCCESS] Checkout flow verified");
    Ok(())
}
