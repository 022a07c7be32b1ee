//! Queue and run one match on the first field set.
//!
//! ```sh
//! cargo run --example fieldset_control -- http://localhost <client_id> <client_secret> <expiration_ms>
//! ```

use std::time::Duration;

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

    let mut fieldsets = client.fieldsets().await?;
    anyhow::ensure!(!fieldsets.is_empty(), "no field sets at this event");
    let fieldset = fieldsets.remove(0);

    println!("controlling field set {} ({})", fieldset.id(), fieldset.name());
    for field in fieldset.fields().await? {
        println!("  field {}: {}", field.id, field.name);
    }

    fieldset.connect().await?;

    fieldset.on(NoticeKind::MatchStarted, |notice| {
        println!("match started: {notice:?}");
    });
    fieldset.on(NoticeKind::MatchStopped, |notice| {
        println!("match stopped: {notice:?}");
    });

    fieldset.queue_next_match().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    fieldset.start_match(1).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    fieldset.end_match_early(1).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    fieldset.disconnect().await;
    Ok(())
}
