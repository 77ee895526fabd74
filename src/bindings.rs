// Static key maps for the legged teleop
//
// Lowercase motion keys drive and turn, their shifted variants strafe
// (holonomic mode). Digits and a-h nudge the body pose.

/// What a single key asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    /// Direction flags (x, y, z, yaw)
    Move([f64; 4]),
    /// Factors for (linear speed, angular speed)
    Speed(f64, f64),
    /// Unit steps (x, y, z, roll, pitch, yaw) scaled by the pose speeds
    Pose([f64; 6]),
    /// Factors for (pose linear step, pose angular step)
    PoseSpeed(f64, f64),
}

#[rustfmt::skip]
const MOVE_BINDINGS: &[(char, [f64; 4])] = &[
    ('i', [1.0, 0.0, 0.0, 0.0]),
    ('o', [1.0, 0.0, 0.0, -1.0]),
    ('j', [0.0, 0.0, 0.0, 1.0]),
    ('l', [0.0, 0.0, 0.0, -1.0]),
    ('u', [1.0, 0.0, 0.0, 1.0]),
    (',', [-1.0, 0.0, 0.0, 0.0]),
    ('.', [-1.0, 0.0, 0.0, 1.0]),
    ('m', [-1.0, 0.0, 0.0, -1.0]),
    ('O', [1.0, -1.0, 0.0, 0.0]),
    ('I', [1.0, 0.0, 0.0, 0.0]),
    ('J', [0.0, 1.0, 0.0, 0.0]),
    ('L', [0.0, -1.0, 0.0, 0.0]),
    ('U', [1.0, 1.0, 0.0, 0.0]),
    ('<', [-1.0, 0.0, 0.0, 0.0]),
    ('>', [-1.0, -1.0, 0.0, 0.0]),
    ('M', [-1.0, 1.0, 0.0, 0.0]),
];

const SPEED_BINDINGS: &[(char, (f64, f64))] = &[
    ('q', (1.1, 1.1)),
    ('z', (0.9, 0.9)),
    ('w', (1.1, 1.0)),
    ('x', (0.9, 1.0)),
    ('e', (1.0, 1.1)),
    ('c', (1.0, 0.9)),
];

#[rustfmt::skip]
const POSE_BINDINGS: &[(char, [f64; 6])] = &[
    ('1', [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ('2', [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ('3', [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
    ('4', [0.0, -1.0, 0.0, 0.0, 0.0, 0.0]),
    ('5', [0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
    ('6', [0.0, 0.0, -1.0, 0.0, 0.0, 0.0]),
    ('a', [0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
    ('s', [0.0, 0.0, 0.0, -1.0, 0.0, 0.0]),
    ('d', [0.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
    ('f', [0.0, 0.0, 0.0, 0.0, -1.0, 0.0]),
    ('g', [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
    ('h', [0.0, 0.0, 0.0, 0.0, 0.0, -1.0]),
];

const POSE_SPEED_BINDINGS: &[(char, (f64, f64))] = &[
    ('r', (1.1, 1.0)),
    ('v', (0.9, 1.0)),
    ('t', (1.0, 1.1)),
    ('b', (1.0, 0.9)),
];

fn find<T: Copy>(table: &[(char, T)], key: char) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
}

/// Look up a key in the binding tables
pub fn lookup(key: char) -> Option<Binding> {
    find(MOVE_BINDINGS, key)
        .map(Binding::Move)
        .or_else(|| find(SPEED_BINDINGS, key).map(|(l, a)| Binding::Speed(l, a)))
        .or_else(|| find(POSE_BINDINGS, key).map(Binding::Pose))
        .or_else(|| find(POSE_SPEED_BINDINGS, key).map(|(l, a)| Binding::PoseSpeed(l, a)))
}

pub const HELP: &str = r#"
Reading from the keyboard and Publishing to Twist and Pose!
---------------------------
Moving around:
   u    i    o
   j    k    l
   m    ,    .

For Holonomic mode (strafing), hold down the shift key:
---------------------------
   U    I    O
   J    K    L
   M    <    >

Body pose:
---------------------------
1/2 : move the body forward/back (+/-x)
3/4 : move the body right/left (+/-y)

5/6 : move the body up/down (+/-z)

a/s : body's roll
d/f : body's pitch
g/h : body's yaw

anything else : stop

q/z : increase/decrease max speeds by 10%
w/x : increase/decrease only linear speed by 10%
e/c : increase/decrease only angular speed by 10%

r/v : increase/decrease body's pose translation by 10%
t/b : increase/decrease body's pose angular speed by 10%

CTRL-C to quit
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_do_not_overlap() {
        let mut keys: Vec<char> = MOVE_BINDINGS
            .iter()
            .map(|(k, _)| *k)
            .chain(SPEED_BINDINGS.iter().map(|(k, _)| *k))
            .chain(POSE_BINDINGS.iter().map(|(k, _)| *k))
            .chain(POSE_SPEED_BINDINGS.iter().map(|(k, _)| *k))
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup('i'), Some(Binding::Move([1.0, 0.0, 0.0, 0.0])));
        assert_eq!(lookup('J'), Some(Binding::Move([0.0, 1.0, 0.0, 0.0])));
        assert_eq!(lookup('x'), Some(Binding::Speed(0.9, 1.0)));
        assert_eq!(lookup('h'), Some(Binding::Pose([0.0, 0.0, 0.0, 0.0, 0.0, -1.0])));
        assert_eq!(lookup('t'), Some(Binding::PoseSpeed(1.0, 1.1)));
        assert_eq!(lookup('k'), None);
        assert_eq!(lookup('\u{3}'), None);
    }
}
