// Zenoh session setup and the teleop session
//
// The async side only opens the session, declares both publishers and
// watches for Ctrl-C. Key reading and publishing are blocking, so they run
// on a blocking task and the publisher's own thread.

use tracing::{info, warn};
use zenoh::qos::CongestionControl;

use crate::config::Config;
use crate::error::Result;
use crate::keyboard::TerminalKeys;
use crate::publisher::CoalescingPublisher;
use crate::shutdown::ShutdownSignal;
use crate::sink::ZenohSink;
use crate::teleop::{self, Teleop};

pub async fn run(config: Config) -> Result<()> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers...");
    // Drop on congestion: slow consumers get the newest command, not a backlog
    let velocity = session
        .declare_publisher(config.twist_topic())
        .congestion_control(CongestionControl::Drop)
        .await?;
    let pose = session
        .declare_publisher(config.pose_topic())
        .congestion_control(CongestionControl::Drop)
        .await?;

    match config.publish_period() {
        Some(period) => info!("Republishing every {}ms", period.as_millis()),
        None => info!("Publishing on key press only"),
    }

    let shutdown = ShutdownSignal::new();
    tokio::spawn(watch_ctrl_c(shutdown.clone()));

    let velocity = ZenohSink::new(velocity);
    let pose = ZenohSink::new(pose);
    let result = tokio::task::spawn_blocking(move || session_loop(&config, velocity, pose, &shutdown)).await?;

    session.close().await?;
    result
}

fn session_loop(
    config: &Config,
    velocity: ZenohSink,
    pose: ZenohSink,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let mut teleop = Teleop::new(config);
    let mut publisher = CoalescingPublisher::new(velocity, pose, config.publish_period())
        .with_shutdown(shutdown.clone())
        .with_subscriber_log_every(config.subscriber_log_every)
        .spawn(teleop.command())?;

    let mut keys = TerminalKeys::new(shutdown.clone());
    teleop::drive(
        &mut teleop,
        &mut keys,
        &mut publisher,
        config.key_timeout(),
        shutdown,
    )
}

// In raw mode Ctrl-C arrives as a key; this covers the time outside key reads
async fn watch_ctrl_c(shutdown: ShutdownSignal) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Shutdown requested");
            shutdown.trigger();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}
