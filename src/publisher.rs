// Rate-limited publisher thread
//
// Lifecycle: WaitingForSubscribers -> Running -> Draining -> Stopped
// - waits until both channels have a consumer (or a shutdown/stop request)
// - republishes the latest command every period, and immediately on update
// - always sends a zero velocity with the last pose on the way out

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::cadence::Cadence;
use crate::error::{Result, TeleopError};
use crate::messages::{PoseCommand, VelocityCommand};
use crate::shutdown::ShutdownSignal;
use crate::sink::CommandSink;
use crate::state::{CommandState, SharedCommandState};

/// How often the consumer count is checked during startup
pub const SUBSCRIBER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Log the missing consumers once every this many polls
pub const SUBSCRIBER_LOG_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherPhase {
    WaitingForSubscribers,
    Running,
    Draining,
    Stopped,
}

enum Readiness {
    Ready,
    StopRequested,
}

/// Publishes velocity and pose commands built from the shared state
pub struct CoalescingPublisher<V, P> {
    velocity: V,
    pose: P,
    period: Option<Duration>,
    poll_interval: Duration,
    log_every: u32,
    shutdown: ShutdownSignal,
}

impl<V, P> CoalescingPublisher<V, P>
where
    V: CommandSink<VelocityCommand> + 'static,
    P: CommandSink<PoseCommand> + 'static,
{
    /// `period` of `None` publishes on change only
    pub fn new(velocity: V, pose: P, period: Option<Duration>) -> Self {
        Self {
            velocity,
            pose,
            period,
            poll_interval: SUBSCRIBER_POLL_INTERVAL,
            log_every: SUBSCRIBER_LOG_EVERY,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_subscriber_log_every(mut self, polls: u32) -> Self {
        self.log_every = polls;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start the publisher thread with `initial` as the first command
    pub fn spawn(self, initial: CommandState) -> Result<PublisherHandle> {
        let state = Arc::new(SharedCommandState::new(initial));
        let thread_state = Arc::clone(&state);

        let thread = thread::Builder::new()
            .name("teleop-publisher".to_string())
            .spawn(move || self.run(&thread_state))
            .map_err(TeleopError::Thread)?;

        Ok(PublisherHandle {
            state,
            thread: Some(thread),
        })
    }

    fn run(self, state: &SharedCommandState) {
        let _unwind = UnwindGuard(state);

        match self.wait_for_subscribers(state) {
            Ok(Readiness::Ready) => {
                info!(
                    "Publishing to {} and {}",
                    self.velocity.name(),
                    self.pose.name()
                );
                state.set_phase(PublisherPhase::Running);
                self.publish_loop(state);
                state.set_phase(PublisherPhase::Draining);
            }
            Ok(Readiness::StopRequested) => state.set_phase(PublisherPhase::Draining),
            Err(e) => state.fail_setup(e),
        }

        self.drain(state);
        state.set_phase(PublisherPhase::Stopped);
    }

    fn wait_for_subscribers(&self, state: &SharedCommandState) -> Result<Readiness> {
        let mut cadence = Cadence::new(self.log_every);
        loop {
            if self.shutdown.is_triggered() {
                return Err(TeleopError::SetupAborted);
            }

            let velocity_ready = self.velocity.has_consumers()?;
            let pose_ready = self.pose.has_consumers()?;
            if velocity_ready && pose_ready {
                return Ok(Readiness::Ready);
            }

            if cadence.tick() {
                for name in self.unconnected(velocity_ready, pose_ready) {
                    info!("Waiting for subscriber to connect to {}", name);
                }
            }

            if state.wait_done(self.poll_interval) {
                return Ok(Readiness::StopRequested);
            }
        }
    }

    fn unconnected(&self, velocity_ready: bool, pose_ready: bool) -> Vec<&str> {
        let mut names = Vec::new();
        if !velocity_ready {
            names.push(self.velocity.name());
        }
        if !pose_ready {
            names.push(self.pose.name());
        }
        names
    }

    fn publish_loop(&self, state: &SharedCommandState) {
        while let Some(snapshot) = state.wait_for_change(self.period) {
            self.emit(
                &VelocityCommand::from(&snapshot),
                &PoseCommand::from(&snapshot),
            );
        }
    }

    // Motion intent is zeroed, the body keeps its last pose
    fn drain(&self, state: &SharedCommandState) {
        let last = state.snapshot();
        self.emit(&VelocityCommand::stop(), &PoseCommand::from(&last));
        info!("Sent stop command");
    }

    fn emit(&self, velocity: &VelocityCommand, pose: &PoseCommand) {
        if let Err(e) = self.velocity.publish(velocity) {
            warn!("Failed to publish to {}: {}", self.velocity.name(), e);
        }
        if let Err(e) = self.pose.publish(pose) {
            warn!("Failed to publish to {}: {}", self.pose.name(), e);
        }
    }
}

// Only acts while unwinding, so a panic never leaves the main thread waiting
struct UnwindGuard<'a>(&'a SharedCommandState);

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Publisher thread panicked");
            self.0.mark_panicked();
        }
    }
}

/// Owner side of a running publisher: update the command, wait for readiness, stop
pub struct PublisherHandle {
    state: Arc<SharedCommandState>,
    thread: Option<JoinHandle<()>>,
}

impl PublisherHandle {
    /// Replace the published command; the caller passes the complete state
    pub fn update(&self, command: CommandState) {
        self.state.update(command);
    }

    /// Last command handed to [`update`](Self::update)
    pub fn command(&self) -> CommandState {
        self.state.snapshot()
    }

    pub fn phase(&self) -> PublisherPhase {
        self.state.phase()
    }

    /// Block until both channels have consumers
    pub fn wait_until_ready(&self) -> Result<()> {
        self.state.wait_ready()
    }

    /// Halt motion, let the thread send its stop command, then join it
    ///
    /// Calling this again after the thread has exited does nothing.
    pub fn request_stop(&mut self) -> Result<()> {
        self.state.finish();
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| TeleopError::PublisherPanicked)?;
        }
        Ok(())
    }
}

impl Drop for PublisherHandle {
    fn drop(&mut self) {
        if let Err(e) = self.request_stop() {
            warn!("Failed to stop publisher on drop: {}", e);
        }
    }
}
