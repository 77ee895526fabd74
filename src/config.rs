// Speeds, rates, topics
use std::time::Duration;

use clap::Parser;

// Default motion scales
pub const DEFAULT_SPEED: f64 = 0.5; // m/s
pub const DEFAULT_TURN: f64 = 1.0; // rad/s
pub const DEFAULT_POSE_SPEED: f64 = 0.01; // m per key press
pub const DEFAULT_POSE_TURN: f64 = 0.1; // rad per key press

// Re-print the help banner after this many status lines
pub const DEFAULT_MSG_MAX: u32 = 14;

// Zenoh topics are <robot_name>/<suffix> unless overridden
pub const DEFAULT_ROBOT_NAME: &str = "robot";
pub const TWIST_TOPIC_SUFFIX: &str = "cmd_vel";
pub const POSE_TOPIC_SUFFIX: &str = "body_pose";

/// Keyboard teleop for legged robots: velocity and body pose over zenoh
#[derive(Debug, Clone, Parser)]
#[command(name = "legged-teleop-keyboard", version, about)]
pub struct Config {
    /// Base linear speed (m/s)
    #[arg(long, default_value_t = DEFAULT_SPEED, value_parser = non_negative)]
    pub speed: f64,

    /// Base angular speed (rad/s)
    #[arg(long, default_value_t = DEFAULT_TURN, value_parser = non_negative)]
    pub turn: f64,

    /// Body translation per key press (m)
    #[arg(long, default_value_t = DEFAULT_POSE_SPEED, value_parser = non_negative)]
    pub pose_speed: f64,

    /// Body rotation per key press (rad)
    #[arg(long, default_value_t = DEFAULT_POSE_TURN, value_parser = non_negative)]
    pub pose_turn: f64,

    /// Republish rate in Hz; 0 publishes only when a key changes the command
    #[arg(long, default_value_t = 0.0, value_parser = non_negative)]
    pub repeat_rate: f64,

    /// Seconds without a key before motion is stopped; 0 waits forever
    #[arg(long, default_value_t = 0.0, value_parser = non_negative)]
    pub key_timeout: f64,

    /// Status lines between help banner reprints
    #[arg(long, default_value_t = DEFAULT_MSG_MAX)]
    pub msg_max: u32,

    /// Prefix for both topics
    #[arg(long, default_value = DEFAULT_ROBOT_NAME)]
    pub robot_name: String,

    /// Velocity topic (default: <robot_name>/cmd_vel)
    #[arg(long)]
    pub twist_topic: Option<String>,

    /// Body pose topic (default: <robot_name>/body_pose)
    #[arg(long)]
    pub pose_topic: Option<String>,

    /// Polls between "waiting for subscriber" log lines
    #[arg(long, default_value_t = crate::publisher::SUBSCRIBER_LOG_EVERY)]
    pub subscriber_log_every: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            turn: DEFAULT_TURN,
            pose_speed: DEFAULT_POSE_SPEED,
            pose_turn: DEFAULT_POSE_TURN,
            repeat_rate: 0.0,
            key_timeout: 0.0,
            msg_max: DEFAULT_MSG_MAX,
            robot_name: DEFAULT_ROBOT_NAME.to_string(),
            twist_topic: None,
            pose_topic: None,
            subscriber_log_every: crate::publisher::SUBSCRIBER_LOG_EVERY,
        }
    }
}

impl Config {
    pub fn twist_topic(&self) -> String {
        self.twist_topic
            .clone()
            .unwrap_or_else(|| topic(&self.robot_name, TWIST_TOPIC_SUFFIX))
    }

    pub fn pose_topic(&self) -> String {
        self.pose_topic
            .clone()
            .unwrap_or_else(|| topic(&self.robot_name, POSE_TOPIC_SUFFIX))
    }

    /// Interval between republishes, `None` when publishing on change only
    pub fn publish_period(&self) -> Option<Duration> {
        positive_secs(1.0 / self.repeat_rate)
    }

    /// Key read timeout, `None` to block until a key arrives
    pub fn key_timeout(&self) -> Option<Duration> {
        positive_secs(self.key_timeout)
    }
}

fn topic(robot_name: &str, suffix: &str) -> String {
    let prefix = robot_name.trim_matches('/');
    if prefix.is_empty() {
        suffix.to_string()
    } else {
        format!("{}/{}", prefix, suffix)
    }
}

// 1.0 / 0.0 is infinite, which also maps to None
fn positive_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

fn non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("expected a non-negative number, got {}", s))
    }
}
