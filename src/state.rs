// Command state shared between the key reader and the publisher thread
//
// One mutex guards every field and one condvar carries the wake-ups:
// - update() replaces the whole command and wakes the publisher
// - the publisher sleeps until an update, a stop request, or its period elapses
// - phase changes are broadcast so the main thread can wait for readiness

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{Result, TeleopError};
use crate::publisher::PublisherPhase;

/// Latest teleop intent: direction flags, speed scales and the accumulated body pose
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommandState {
    // Direction flags in {-1, 0, 1}
    pub linear_x: f64,
    pub linear_y: f64,
    pub linear_z: f64,
    pub angular: f64,

    pub linear_speed: f64,
    pub angular_speed: f64,

    // Accumulated body offsets (meters, radians)
    pub pose_x: f64,
    pub pose_y: f64,
    pub pose_z: f64,
    pub pose_roll: f64,
    pub pose_pitch: f64,
    pub pose_yaw: f64,

    pub pose_linear_speed: f64,
    pub pose_angular_speed: f64,
}

impl CommandState {
    /// Zeroed motion with the given speed scales
    pub fn with_speeds(
        linear_speed: f64,
        angular_speed: f64,
        pose_linear_speed: f64,
        pose_angular_speed: f64,
    ) -> Self {
        Self {
            linear_speed,
            angular_speed,
            pose_linear_speed,
            pose_angular_speed,
            ..Self::default()
        }
    }

    pub fn is_moving(&self) -> bool {
        self.linear_x != 0.0 || self.linear_y != 0.0 || self.linear_z != 0.0 || self.angular != 0.0
    }

    /// Same state with every motion flag cleared; pose and speeds are kept
    pub fn halted(&self) -> Self {
        Self {
            linear_x: 0.0,
            linear_y: 0.0,
            linear_z: 0.0,
            angular: 0.0,
            ..*self
        }
    }
}

#[derive(Debug)]
struct Inner {
    command: CommandState,
    pending: bool,
    done: bool,
    phase: PublisherPhase,
    setup_error: Option<TeleopError>,
}

/// Lock-protected [`CommandState`] plus the publisher's lifecycle flags
#[derive(Debug)]
pub struct SharedCommandState {
    inner: Mutex<Inner>,
    wake: Condvar,
}

impl SharedCommandState {
    pub fn new(initial: CommandState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                command: initial,
                pending: false,
                done: false,
                phase: PublisherPhase::WaitingForSubscribers,
                setup_error: None,
            }),
            wake: Condvar::new(),
        }
    }

    // Fields are plain values, so a panic while holding the lock cannot leave them torn
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole command atomically and wake the publisher
    pub fn update(&self, command: CommandState) {
        let mut inner = self.lock();
        inner.command = command;
        inner.pending = true;
        self.wake.notify_one();
    }

    /// Mark done and halt motion in a single step, keeping pose and speeds
    ///
    /// Returns false if done was already set.
    pub fn finish(&self) -> bool {
        let mut inner = self.lock();
        if inner.done {
            return false;
        }
        inner.done = true;
        inner.command = inner.command.halted();
        inner.pending = true;
        self.wake.notify_all();
        true
    }

    pub fn snapshot(&self) -> CommandState {
        self.lock().command
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    /// Block until an update arrives or `period` elapses, then return the latest command
    ///
    /// `None` as period waits for an update only. Returns `None` once done is set.
    pub fn wait_for_change(&self, period: Option<Duration>) -> Option<CommandState> {
        let guard = self.lock();
        let idle = |inner: &mut Inner| !inner.pending && !inner.done;

        let mut inner = match period {
            Some(period) => {
                self.wake
                    .wait_timeout_while(guard, period, idle)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .wake
                .wait_while(guard, idle)
                .unwrap_or_else(PoisonError::into_inner),
        };

        if inner.done {
            return None;
        }
        inner.pending = false;
        Some(inner.command)
    }

    /// Sleep up to `timeout` unless done is set; returns the done flag
    pub fn wait_done(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (inner, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |inner| !inner.done)
            .unwrap_or_else(PoisonError::into_inner);
        inner.done
    }

    pub fn phase(&self) -> PublisherPhase {
        self.lock().phase
    }

    pub fn set_phase(&self, phase: PublisherPhase) {
        let mut inner = self.lock();
        inner.phase = phase;
        self.wake.notify_all();
    }

    /// Record why setup failed and move straight to draining
    pub fn fail_setup(&self, error: TeleopError) {
        let mut inner = self.lock();
        inner.setup_error = Some(error);
        inner.phase = PublisherPhase::Draining;
        self.wake.notify_all();
    }

    /// Publisher thread is unwinding: release anyone waiting on it
    pub fn mark_panicked(&self) {
        let mut inner = self.lock();
        if inner.phase == PublisherPhase::WaitingForSubscribers {
            inner.setup_error = Some(TeleopError::PublisherPanicked);
        }
        inner.phase = PublisherPhase::Stopped;
        self.wake.notify_all();
    }

    /// Block while the publisher is still waiting for subscribers
    ///
    /// A setup failure is reported to the first caller only.
    pub fn wait_ready(&self) -> Result<()> {
        let guard = self.lock();
        let mut inner = self
            .wake
            .wait_while(guard, |inner| {
                inner.phase == PublisherPhase::WaitingForSubscribers
            })
            .unwrap_or_else(PoisonError::into_inner);
        match inner.setup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
