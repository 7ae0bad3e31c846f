//! moi-watch entry point.
//!
//! Connects to the moi notification channel, tracks the caller's job and
//! group records, and logs every change until the channel closes.

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use moi_client::channel::{Hooks, NotificationClient};
use moi_client::config::{ClientConfig, LogFormat};
use moi_client::protocol::{Action, Event};
use moi_client::tracker::{Applied, RecordList};
use moi_client::transport::WsConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ClientConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(endpoint = %config.endpoint(), scope = ?config.scope(), "starting moi-watch");

    // Route record events to the tracker
    let mut client = NotificationClient::from_config(&config, WsConnector::new());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Event>();
    for action in [Action::Add, Action::Get, Action::Update, Action::Remove] {
        let tx = events_tx.clone();
        client.add_event_callback(action, move |event| {
            let _ = tx.send(event);
        });
    }
    drop(events_tx);

    // Open the channel
    let hooks = Hooks::new().on_resync(|trigger| tracing::debug!(?trigger, "resync sent"));
    client.init(hooks).await?;
    let handle = client.handle();
    let driver = tokio::spawn(async move { client.run().await });

    let mut records = RecordList::new(config.scope());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut closing = false;

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => log_change(&mut records, &event),
                None => break,
            },
            result = &mut shutdown, if !closing => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "ctrl-c handler failed");
                }
                closing = true;
                tracing::info!("closing notification channel");
                if let Err(e) = handle.close() {
                    tracing::debug!(error = %e, "channel already closing");
                }
            }
        }
    }

    let reason = driver.await??;
    tracing::info!(?reason, tracked = records.len(), "moi-watch finished");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn log_change(records: &mut RecordList, event: &Event) {
    match records.apply(event) {
        Applied::Inserted | Applied::Updated => {
            if let Some(entry) = event.record().and_then(|r| records.get(&r.id)) {
                tracing::info!(
                    action = %event.action(),
                    id = %entry.record.id,
                    kind = ?entry.record.kind,
                    "{entry}"
                );
            }
        }
        Applied::Removed(count) => {
            tracing::info!(removed = count, tracked = records.len(), "records dropped");
        }
        Applied::Ignored => tracing::trace!(action = %event.action(), "event ignored"),
    }
}
