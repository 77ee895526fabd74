// Key-driven command editing and the blocking teleop loop
//
// The loop owns the local copy of the command. Every key that changes it is
// followed by a full update to the publisher; whatever ends the loop, the
// publisher is stopped (and its stop command sent) before returning.

use std::time::Duration;

use tracing::info;

use crate::bindings::{self, Binding};
use crate::cadence::Cadence;
use crate::config::Config;
use crate::error::Result;
use crate::keyboard::{CTRL_C, KeySource};
use crate::publisher::PublisherHandle;
use crate::shutdown::ShutdownSignal;
use crate::state::CommandState;

/// Result of feeding one key (or a timeout) to the teleop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Command changed or must be resent
    Update,
    /// Timeout while already stopped, nothing to send
    Skip,
    /// Ctrl-C: halt and leave the loop
    Quit,
}

/// Local command state edited by key presses
#[derive(Debug, Clone)]
pub struct Teleop {
    command: CommandState,
    banner: Cadence,
}

impl Teleop {
    pub fn new(config: &Config) -> Self {
        Self {
            command: CommandState::with_speeds(
                config.speed,
                config.turn,
                config.pose_speed,
                config.pose_turn,
            ),
            banner: Cadence::new(config.msg_max),
        }
    }

    pub fn command(&self) -> CommandState {
        self.command
    }

    /// Apply a key (`None` for a read timeout) to the local command
    pub fn apply_key(&mut self, key: Option<char>) -> KeyOutcome {
        let binding = key.and_then(bindings::lookup);
        let cmd = &mut self.command;

        match binding {
            Some(Binding::Move([x, y, z, th])) => {
                cmd.linear_x = x;
                cmd.linear_y = y;
                cmd.linear_z = z;
                cmd.angular = th;
            }
            Some(Binding::Speed(linear, angular)) => {
                cmd.linear_speed *= linear;
                cmd.angular_speed *= angular;
                *cmd = cmd.halted();
                info!("{}", speed_status(cmd));
                self.count_status();
            }
            Some(Binding::Pose(step)) => {
                cmd.pose_x += cmd.pose_linear_speed * step[0];
                cmd.pose_y += cmd.pose_linear_speed * step[1];
                cmd.pose_z += cmd.pose_linear_speed * step[2];
                cmd.pose_roll += cmd.pose_angular_speed * step[3];
                cmd.pose_pitch += cmd.pose_angular_speed * step[4];
                cmd.pose_yaw += cmd.pose_angular_speed * step[5];
                *cmd = cmd.halted();
                info!("{}", pose_status(cmd));
                self.count_status();
            }
            Some(Binding::PoseSpeed(linear, angular)) => {
                cmd.pose_linear_speed *= linear;
                cmd.pose_angular_speed *= angular;
                *cmd = cmd.halted();
                info!("{}", pose_speed_status(cmd));
                self.count_status();
            }
            None => {
                if key.is_none() && !cmd.is_moving() {
                    return KeyOutcome::Skip;
                }
                *cmd = cmd.halted();
                if key == Some(CTRL_C) {
                    return KeyOutcome::Quit;
                }
            }
        }
        KeyOutcome::Update
    }

    // Reprint the help once every msg_max status lines
    fn count_status(&mut self) {
        if self.banner.tick() {
            info!("{}", bindings::HELP);
        }
    }
}

pub fn speed_status(cmd: &CommandState) -> String {
    format!(
        "currently:\tspeed {}\tturn {} ",
        cmd.linear_speed, cmd.angular_speed
    )
}

pub fn pose_speed_status(cmd: &CommandState) -> String {
    format!(
        "currently:\tpose_speed {}\tpose_turn {} ",
        cmd.pose_linear_speed, cmd.pose_angular_speed
    )
}

pub fn pose_status(cmd: &CommandState) -> String {
    format!(
        "currently:\tx {}\ty {}\tz {}\troll {}\tpitch {}\tyaw {} ",
        cmd.pose_x, cmd.pose_y, cmd.pose_z, cmd.pose_roll, cmd.pose_pitch, cmd.pose_yaw
    )
}

/// Run the teleop until Ctrl-C, a shutdown request or an input error
///
/// The publisher is always stopped and joined before this returns. Errors are
/// returned, not logged; the caller reports them.
pub fn drive<K: KeySource>(
    teleop: &mut Teleop,
    keys: &mut K,
    publisher: &mut PublisherHandle,
    key_timeout: Option<Duration>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let result = run_keys(teleop, keys, publisher, key_timeout, shutdown);
    let stopped = publisher.request_stop();
    result.and(stopped)
}

fn run_keys<K: KeySource>(
    teleop: &mut Teleop,
    keys: &mut K,
    publisher: &PublisherHandle,
    key_timeout: Option<Duration>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    publisher.wait_until_ready()?;
    publisher.update(teleop.command());

    info!("{}", bindings::HELP);
    info!("{}", speed_status(&teleop.command()));

    while !shutdown.is_triggered() {
        let key = keys.next_key(key_timeout)?;
        match teleop.apply_key(key) {
            KeyOutcome::Update => publisher.update(teleop.command()),
            KeyOutcome::Skip => continue,
            KeyOutcome::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeleopError;
    use crate::messages::{PoseCommand, Quaternion, VelocityCommand, Vector3};
    use crate::publisher::CoalescingPublisher;
    use crate::sink::recording::RecordingSink;
    use std::collections::VecDeque;
    use std::io;
    use std::thread;

    /// Replays keys, pausing between them so each one is published on its own
    struct ScriptedKeys {
        keys: VecDeque<Result<Option<char>>>,
        pause: Duration,
    }

    impl ScriptedKeys {
        fn new(keys: &[Option<char>]) -> Self {
            Self {
                keys: keys.iter().map(|&k| Ok(k)).collect(),
                pause: Duration::from_millis(20),
            }
        }

        fn then_fail(mut self) -> Self {
            self.keys.push_back(Err(TeleopError::Input(io::Error::other(
                "keyboard unplugged",
            ))));
            self
        }
    }

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self, _timeout: Option<Duration>) -> Result<Option<char>> {
            thread::sleep(self.pause);
            self.keys.pop_front().unwrap_or(Ok(Some(CTRL_C)))
        }
    }

    fn teleop() -> Teleop {
        Teleop::new(&Config::default())
    }

    fn velocity(teleop: &Teleop) -> VelocityCommand {
        VelocityCommand::from(&teleop.command())
    }

    #[test]
    fn test_move_turn_and_speed_keys() {
        let mut teleop = teleop();

        assert_eq!(teleop.apply_key(Some('i')), KeyOutcome::Update);
        assert_eq!(velocity(&teleop).linear, Vector3 { x: 0.5, y: 0.0, z: 0.0 });
        assert_eq!(velocity(&teleop).angular, Vector3::default());

        teleop.apply_key(Some('l'));
        assert_eq!(velocity(&teleop).linear, Vector3::default());
        assert_eq!(velocity(&teleop).angular, Vector3 { x: 0.0, y: 0.0, z: -1.0 });

        teleop.apply_key(Some('q'));
        assert!((teleop.command().linear_speed - 0.55).abs() < 1e-12);
        assert!((teleop.command().angular_speed - 1.1).abs() < 1e-12);
        assert!(!teleop.command().is_moving());

        teleop.apply_key(Some('i'));
        assert!((velocity(&teleop).linear.x - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_pose_keys_accumulate() {
        let mut teleop = teleop();

        teleop.apply_key(Some('1'));
        let pose = PoseCommand::from(&teleop.command());
        assert_eq!(pose.position.x, 0.01);
        assert_eq!(pose.position.y, 0.0);
        assert_eq!(pose.position.z, 0.0);
        assert_eq!(pose.orientation, Quaternion::identity());

        teleop.apply_key(Some('1'));
        assert_eq!(PoseCommand::from(&teleop.command()).position.x, 0.02);

        teleop.apply_key(Some('g'));
        assert!((teleop.command().pose_yaw - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_pose_key_stops_motion() {
        let mut teleop = teleop();
        teleop.apply_key(Some('U'));
        assert!(teleop.command().is_moving());

        teleop.apply_key(Some('5'));
        assert!(!teleop.command().is_moving());
        assert_eq!(teleop.command().pose_z, 0.01);
    }

    #[test]
    fn test_pose_speed_keys() {
        let mut teleop = teleop();
        teleop.apply_key(Some('r'));
        teleop.apply_key(Some('b'));
        assert!((teleop.command().pose_linear_speed - 0.011).abs() < 1e-12);
        assert!((teleop.command().pose_angular_speed - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_idle_timeout_is_skipped_only_when_stopped() {
        let mut teleop = teleop();
        assert_eq!(teleop.apply_key(None), KeyOutcome::Skip);

        teleop.apply_key(Some('j'));
        assert_eq!(teleop.apply_key(None), KeyOutcome::Update);
        assert!(!teleop.command().is_moving());
        assert_eq!(teleop.apply_key(None), KeyOutcome::Skip);
    }

    #[test]
    fn test_unbound_key_stops_and_ctrl_c_quits() {
        let mut teleop = teleop();
        teleop.apply_key(Some('i'));
        assert_eq!(teleop.apply_key(Some('k')), KeyOutcome::Update);
        assert!(!teleop.command().is_moving());

        teleop.apply_key(Some('i'));
        assert_eq!(teleop.apply_key(Some(CTRL_C)), KeyOutcome::Quit);
        assert!(!teleop.command().is_moving());
    }

    #[test]
    fn test_status_counter_wraps() {
        let mut teleop = Teleop::new(&Config {
            msg_max: 2,
            ..Config::default()
        });
        for expected in [1, 2, 0, 1] {
            teleop.apply_key(Some('q'));
            assert_eq!(teleop.banner.count(), expected);
        }
    }

    #[test]
    fn test_huge_msg_max_does_not_overflow() {
        let mut teleop = Teleop::new(&Config {
            msg_max: u32::MAX,
            ..Config::default()
        });
        for key in ['q', '1', 'r'] {
            assert_eq!(teleop.apply_key(Some(key)), KeyOutcome::Update);
        }
        assert_eq!(teleop.banner.count(), 3);
    }

    #[test]
    fn test_status_strings() {
        let cmd = CommandState::with_speeds(0.5, 1.0, 0.01, 0.1);
        assert_eq!(speed_status(&cmd), "currently:\tspeed 0.5\tturn 1 ");
        assert_eq!(pose_speed_status(&cmd), "currently:\tpose_speed 0.01\tpose_turn 0.1 ");
        assert!(pose_status(&cmd).starts_with("currently:\tx 0\ty 0"));
    }

    fn start_publisher(
        velocity: &RecordingSink<VelocityCommand>,
        pose: &RecordingSink<PoseCommand>,
        teleop: &Teleop,
    ) -> PublisherHandle {
        CoalescingPublisher::new(velocity.clone(), pose.clone(), None)
            .spawn(teleop.command())
            .unwrap()
    }

    #[test]
    fn test_drive_publishes_each_key_then_stops() {
        let velocity = RecordingSink::new("robot/cmd_vel");
        let pose = RecordingSink::new("robot/body_pose");
        let mut teleop = teleop();
        let mut publisher = start_publisher(&velocity, &pose, &teleop);
        let mut keys = ScriptedKeys::new(&[Some('i'), None, Some('1'), Some('l')]);

        drive(&mut teleop, &mut keys, &mut publisher, None, &ShutdownSignal::new()).unwrap();

        let sent = velocity.messages();
        let linear_x: Vec<f64> = sent.iter().map(|cmd| cmd.linear.x).collect();
        let angular_z: Vec<f64> = sent.iter().map(|cmd| cmd.angular.z).collect();
        // initial, 'i', (timeout while moving), '1', 'l', final stop
        assert_eq!(linear_x, vec![0.0, 0.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(angular_z, vec![0.0, 0.0, 0.0, 0.0, -1.0, 0.0]);

        let last_pose = *pose.messages().last().unwrap();
        assert_eq!(last_pose.position.x, 0.01);
    }

    #[test]
    fn test_input_error_still_sends_stop() {
        let velocity = RecordingSink::new("robot/cmd_vel");
        let pose = RecordingSink::new("robot/body_pose");
        let mut teleop = teleop();
        let mut publisher = start_publisher(&velocity, &pose, &teleop);
        let mut keys = ScriptedKeys::new(&[Some('i')]).then_fail();

        let result = drive(&mut teleop, &mut keys, &mut publisher, None, &ShutdownSignal::new());

        assert!(matches!(result, Err(TeleopError::Input(_))));
        assert_eq!(*velocity.messages().last().unwrap(), VelocityCommand::stop());
        assert_eq!(publisher.phase(), crate::publisher::PublisherPhase::Stopped);
    }

    #[test]
    fn test_shutdown_before_subscribers_aborts() {
        let velocity = RecordingSink::disconnected("robot/cmd_vel");
        let pose = RecordingSink::disconnected("robot/body_pose");
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let mut teleop = teleop();
        let mut publisher = CoalescingPublisher::new(velocity.clone(), pose.clone(), None)
            .with_shutdown(shutdown.clone())
            .spawn(teleop.command())
            .unwrap();
        let mut keys = ScriptedKeys::new(&[Some('i')]);

        let result = drive(&mut teleop, &mut keys, &mut publisher, None, &shutdown);

        assert!(matches!(result, Err(TeleopError::SetupAborted)));
        // Only the stop command, no key was ever read
        assert_eq!(velocity.messages(), vec![VelocityCommand::stop()]);
        assert_eq!(keys.keys.len(), 1);
    }

    /// Reports a timeout after raising the shutdown flag, like a read cut short by SIGINT
    struct InterruptedKeys {
        shutdown: ShutdownSignal,
    }

    impl KeySource for InterruptedKeys {
        fn next_key(&mut self, _timeout: Option<Duration>) -> Result<Option<char>> {
            thread::sleep(Duration::from_millis(20));
            self.shutdown.trigger();
            Ok(None)
        }
    }

    #[test]
    fn test_shutdown_during_read_ends_loop() {
        let velocity = RecordingSink::new("robot/cmd_vel");
        let pose = RecordingSink::new("robot/body_pose");
        let shutdown = ShutdownSignal::new();
        let mut teleop = teleop();
        teleop.apply_key(Some('i'));
        let mut publisher = start_publisher(&velocity, &pose, &teleop);
        let mut keys = InterruptedKeys {
            shutdown: shutdown.clone(),
        };

        drive(&mut teleop, &mut keys, &mut publisher, None, &shutdown).unwrap();

        assert!(shutdown.is_triggered());
        assert_eq!(*velocity.messages().last().unwrap(), VelocityCommand::stop());
    }
}
