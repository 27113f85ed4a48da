// Command listen loop with latest-intent intake and orderly shutdown
// Commands are processed one at a time to completion: actuation first, then a
// best-effort state publish.

use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use zenoh::pubsub::Publisher;

// local imports
use crate::config::{topic_commands, topic_state, topic_wheels};
use crate::dispatcher::Dispatcher;
use crate::identity::ChairIdentity;
use crate::intake::{decode, CommandIntake};
use crate::messages::StatePatch;
use crate::motor::{self, WheelFrame};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub identity_path: PathBuf,
    pub zenoh_config: Option<PathBuf>,
}

/// Publish a state patch, logging and swallowing any failure
async fn publish_patch(publisher: &Publisher<'_>, patch: &StatePatch) {
    if patch.is_empty() {
        return;
    }
    let json = match serde_json::to_string(patch) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode state patch: {}", e);
            return;
        }
    };
    if let Err(e) = publisher.put(json).await {
        warn!("Failed to publish state: {}", e);
    }
}

/// Drain wheel frames from the bridge and put them on the wheel topic
async fn forward_wheel_frames(
    session: zenoh::Session,
    topic: String,
    mut frames: mpsc::UnboundedReceiver<WheelFrame>,
) {
    while let Some(frame) = frames.recv().await {
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode wheel frame: {}", e);
                continue;
            }
        };
        if let Err(e) = session.put(topic.as_str(), json).await {
            warn!("Failed to send wheel frame: {}", e);
        }
    }
    debug!("Wheel bridge closed");
}

pub async fn run(options: RuntimeOptions, mut shutdown: watch::Receiver<bool>) -> Result<(), BoxError> {
    // Topics are keyed by the chair id, so nothing is consumed without an identity
    let identity = ChairIdentity::load_or_register(&options.identity_path)?;

    info!("Opening Zenoh session...");
    let config = match &options.zenoh_config {
        Some(path) => zenoh::Config::from_file(path)?,
        None => zenoh::Config::default(),
    };
    let session = zenoh::open(config).await?;

    let cmd_topic = topic_commands(&identity.id);
    let state_topic = topic_state(&identity.id);
    let wheels_topic = topic_wheels(&identity.id);

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(cmd_topic.clone()).await?;
    let pub_state = session.declare_publisher(state_topic.clone()).await?;

    let (bridge, frames) = motor::bridge();
    let forwarder = tokio::spawn(forward_wheel_frames(session.clone(), wheels_topic.clone(), frames));

    let mut dispatcher = Dispatcher::new(bridge, Instant::now());
    let mut intake = CommandIntake::new();

    info!("Subscribed to: {}", cmd_topic);
    info!("Publishing to: {}, {}", state_topic, wheels_topic);
    publish_patch(&pub_state, &dispatcher.initial_patch()).await;
    info!("Listening for commands...");

    let result: Result<(), BoxError> = loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Shutdown requested");
                break Ok(());
            }
            received = subscriber.recv_async() => {
                let first = match received {
                    Ok(sample) => sample,
                    Err(e) => break Err(e.into()),
                };

                // Drain everything already pending, only the newest command matters
                let mut batch = vec![first];
                while let Ok(Some(sample)) = subscriber.try_recv() {
                    batch.push(sample);
                }
                let envelopes = batch.iter().filter_map(|sample| {
                    let payload = sample.payload().to_bytes();
                    match decode(&payload) {
                        Ok(envelope) => Some(envelope),
                        Err(e) => {
                            warn!("{}", e);
                            None
                        }
                    }
                });
                let Some(envelope) = intake.select(envelopes) else {
                    continue;
                };

                match dispatcher.handle(&envelope.command, envelope.value.as_ref(), Instant::now()) {
                    Ok(Some(patch)) => publish_patch(&pub_state, &patch).await,
                    Ok(None) => {}
                    Err(e) => {
                        error!("Lost actuation channel: {}", e);
                        break Err(e.into());
                    }
                }
            }
        }
    };

    // Teardown: force a stop, then release the actuation channel
    match dispatcher.shutdown(Instant::now()) {
        Ok(patch) => publish_patch(&pub_state, &patch).await,
        Err(e) => error!("Failed to stop motors during shutdown: {}", e),
    }
    drop(dispatcher);
    if let Err(e) = forwarder.await {
        warn!("Wheel forwarder ended abnormally: {}", e);
    }
    info!("Runtime stopped");

    result
}
