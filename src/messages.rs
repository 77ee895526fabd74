// Define message types published by the teleop node

use serde::{Deserialize, Serialize};

use crate::state::CommandState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation as (x, y, z, w), w is the scalar part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// Build a unit quaternion from Euler angles in radians
    ///
    /// Rotations are applied about the static X, then Y, then Z axes
    /// (`q = qz(yaw) * qy(pitch) * qx(roll)`), the `sxyz` convention used by
    /// ROS `tf`. Read as intrinsic rotations this is yaw, pitch', roll''.
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();

        Self {
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
            w: cr * cp * cy + sr * sp * sy,
        }
    }
}

// Velocity command: teleop -> locomotion controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct VelocityCommand {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl VelocityCommand {
    /// All-zero command sent when the publisher shuts down
    pub fn stop() -> Self {
        Self::default()
    }
}

// Motion is planar, so angular x/y are always zero
impl From<&CommandState> for VelocityCommand {
    fn from(state: &CommandState) -> Self {
        Self {
            linear: Vector3 {
                x: state.linear_x * state.linear_speed,
                y: state.linear_y * state.linear_speed,
                z: state.linear_z * state.linear_speed,
            },
            angular: Vector3 {
                x: 0.0,
                y: 0.0,
                z: state.angular * state.angular_speed,
            },
        }
    }
}

// Body pose command: teleop -> body posing controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct PoseCommand {
    pub position: Point,
    pub orientation: Quaternion,
}

impl From<&CommandState> for PoseCommand {
    fn from(state: &CommandState) -> Self {
        Self {
            position: Point {
                x: state.pose_x,
                y: state.pose_y,
                z: state.pose_z,
            },
            orientation: Quaternion::from_euler(state.pose_roll, state.pose_pitch, state.pose_yaw),
        }
    }
}
