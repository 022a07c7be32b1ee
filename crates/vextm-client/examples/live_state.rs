//! Mirror the live state of every field set and print each change.
//!
//! ```sh
//! cargo run --example live_state -- http://localhost <client_id> <client_secret> <expiration_ms>
//! ```

use vextm_client::prelude::*;
use vextm_client::Credentials;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "http://localhost".into());
    let client_id = args.next().expect("client_id argument required");
    let client_secret = args.next().expect("client_secret argument required");
    let expiration_date: u64 = args
        .next()
        .expect("expiration_ms argument required")
        .parse()?;

    let client = Client::new(
        &address,
        Credentials {
            client_id,
            client_secret,
            expiration_date,
        },
    )?;

    let event = client.event_info().await?;
    println!("event: {}", event.name);

    let fieldsets = client.fieldsets().await?;
    let mut handles = Vec::new();

    for fieldset in fieldsets {
        fieldset.connect().await?;
        let fieldset = std::sync::Arc::new(fieldset);

        let watched = fieldset.clone();
        fieldset.on_any(move |notice| {
            println!(
                "[{} {}] {:?} -> {:?}",
                watched.id(),
                watched.name(),
                notice,
                watched.state()
            );
        });

        handles.push(fieldset);
    }

    println!("watching {} field set(s); ctrl-c to exit", handles.len());
    tokio::signal::ctrl_c().await?;

    for fieldset in &handles {
        fieldset.disconnect().await;
    }
    Ok(())
}
