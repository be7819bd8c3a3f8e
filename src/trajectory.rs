//! Scripted motion along a cubic Bézier curve.
//!
//! A trajectory file holds four control records, one per line:
//!
//! ```text
//! # px  py  pz   rx  ry  rz   (rotation in degrees)
//! -1.0 0.0 0.0   0   0   0
//! -0.5 1.0 0.0   0  90   0
//!  0.5 1.0 0.0   0 180   0
//!  1.0 0.0 0.0   0 270   0
//! ```
//!
//! The same Bernstein weights blend positions and rotations. Progress runs
//! from 0 to 1 in fixed steps and restarts at 0.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::Vec3;

/// Progress added per [`Trajectory::advance`] call unless overridden.
pub const DEFAULT_STEP: f32 = 0.001;

#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("failed to read trajectory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("trajectory needs exactly 4 control points, found {found}")]
    ControlPointCount { found: usize },
}

/// The four cubic Bernstein basis values at `t`. They always sum to 1.
pub fn bernstein_weights(t: f32) -> [f32; 4] {
    let u = 1.0 - t;
    [u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t]
}

/// Evaluates a cubic Bézier curve at `t`.
pub fn cubic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let [w0, w1, w2, w3] = bernstein_weights(t);
    p0 * w0 + p1 * w1 + p2 * w2 + p3 * w3
}

/// A position/rotation curve and the progress along it.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    points: [Vec3; 4],
    /// Rotation control points, in degrees.
    rotations: [Vec3; 4],
    t: f32,
    step: f32,
}

impl Trajectory {
    /// Builds a trajectory from positions and rotations (degrees).
    pub fn from_control_points(points: [Vec3; 4], rotations_deg: [Vec3; 4]) -> Self {
        Self {
            points,
            rotations: rotations_deg,
            t: 0.0,
            step: DEFAULT_STEP,
        }
    }

    /// Overrides the per-frame progress step. A step that is not a
    /// positive finite number is ignored with a warning.
    pub fn with_step(mut self, step: f32) -> Self {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        } else {
            log::warn!(
                "invalid trajectory step {}, keeping {}",
                step,
                self.step
            );
        }
        self
    }

    /// Reads a trajectory file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrajectoryError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| TrajectoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            TrajectoryError::Io { source, .. } => io_err(source),
            other => other,
        })
    }

    /// Parses trajectory records from any buffered reader.
    ///
    /// Blank lines and `#` comments are skipped; lines without six numbers
    /// are skipped with a warning.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TrajectoryError> {
        let mut points = Vec::with_capacity(4);
        let mut rotations = Vec::with_capacity(4);

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| TrajectoryError::Io {
                path: PathBuf::new(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let values: Option<Vec<f32>> = trimmed
                .split_whitespace()
                .map(|tok| tok.parse().ok())
                .collect();

            match values.as_deref() {
                Some(&[px, py, pz, rx, ry, rz, ..]) => {
                    points.push(Vec3::new(px, py, pz));
                    rotations.push(Vec3::new(rx, ry, rz));
                }
                _ => log::warn!(
                    "trajectory line {}: expected 6 numbers, skipping '{}'",
                    idx + 1,
                    trimmed
                ),
            }
        }

        let found = points.len();
        match (points.try_into(), rotations.try_into()) {
            (Ok(points), Ok(rotations)) => Ok(Self::from_control_points(points, rotations)),
            _ => Err(TrajectoryError::ControlPointCount { found }),
        }
    }

    /// Position and rotation (radians) at parameter `t`.
    pub fn evaluate(&self, t: f32) -> (Vec3, Vec3) {
        let [p0, p1, p2, p3] = self.points;
        let [r0, r1, r2, r3] = self.rotations;
        let position = cubic_bezier(p0, p1, p2, p3, t);
        let rotation_deg = cubic_bezier(r0, r1, r2, r3, t);
        (position, to_radians(rotation_deg))
    }

    /// Evaluates at the current progress, then steps it forward, restarting
    /// at 0 once it reaches 1. Progress stays in `[0, 1)`.
    pub fn advance(&mut self) -> (Vec3, Vec3) {
        let pose = self.evaluate(self.t);
        self.t += self.step;
        if self.t >= 1.0 {
            self.t = 0.0;
        }
        pose
    }

    /// The starting pose (P0, R0 in radians).
    pub fn start(&self) -> (Vec3, Vec3) {
        (self.points[0], to_radians(self.rotations[0]))
    }

    pub fn progress(&self) -> f32 {
        self.t
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}

fn to_radians(degrees: Vec3) -> Vec3 {
    Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVE: &str = "\
# px py pz rx ry rz
0 0 0 0 0 0

1 2 0 0 90 0
2 2 0 0 180 0
3 0 0 0 360 0
";

    fn curve() -> Trajectory {
        Trajectory::from_reader(CURVE.as_bytes()).unwrap()
    }

    #[test]
    fn weights_sum_to_one() {
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let sum: f32 = bernstein_weights(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "t = {}", t);
        }
    }

    #[test]
    fn endpoints_hit_control_points() {
        let traj = curve();
        let (p, r) = traj.evaluate(0.0);
        assert_eq!(p, Vec3::ZERO);
        assert_eq!(r, Vec3::ZERO);

        let (p, r) = traj.evaluate(1.0);
        assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
        assert!((r.y - std::f32::consts::TAU).abs() < 1e-4);
    }

    #[test]
    fn advance_approaches_last_point_then_wraps() {
        let mut traj = curve();
        assert_eq!(traj.advance().0, Vec3::ZERO);

        // 1000 steps of 0.001 lands at or past 1.0.
        let mut last = Vec3::ZERO;
        for _ in 0..999 {
            last = traj.advance().0;
        }
        assert!((last - Vec3::new(3.0, 0.0, 0.0)).length() < 0.05);

        let mut wrapped = traj.progress() == 0.0;
        for _ in 0..5 {
            traj.advance();
            if traj.progress() == 0.0 {
                wrapped = true;
            }
        }
        assert!(wrapped);
        assert!(traj.progress() < 0.01);
    }

    #[test]
    fn custom_step() {
        let mut traj = curve().with_step(0.5);
        traj.advance();
        assert_eq!(traj.progress(), 0.5);
        traj.advance();
        assert_eq!(traj.progress(), 0.0);
        traj.advance();
        assert_eq!(traj.progress(), 0.5);
    }

    #[test]
    fn progress_never_reaches_one() {
        let mut traj = curve().with_step(0.25);
        let mut seen = Vec::new();
        for _ in 0..6 {
            let (p, _) = traj.advance();
            assert!(p.x < 3.0);
            seen.push(traj.progress());
        }
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 0.0, 0.25, 0.5]);
    }

    #[test]
    fn invalid_steps_keep_the_default() {
        for step in [-0.1, 0.0, f32::NAN, f32::INFINITY] {
            let mut traj = curve().with_step(step);
            assert_eq!(traj.step(), DEFAULT_STEP);
            for _ in 0..3 {
                traj.advance();
            }
            let t = traj.progress();
            assert!(t > 0.0 && t < 1.0, "step {} gave progress {}", step, t);
        }
    }

    #[test]
    fn wrong_point_count_fails() {
        let three = "0 0 0 0 0 0\n1 1 1 0 0 0\n2 2 2 0 0 0\n";
        assert!(matches!(
            Trajectory::from_reader(three.as_bytes()),
            Err(TrajectoryError::ControlPointCount { found: 3 })
        ));

        let five = format!("{}3 3 3 0 0 0\n4 4 4 0 0 0\n", three);
        assert!(matches!(
            Trajectory::from_reader(five.as_bytes()),
            Err(TrajectoryError::ControlPointCount { found: 5 })
        ));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let source = format!("1 2 3\nnot a record at all\n{}", CURVE);
        assert_eq!(Trajectory::from_reader(source.as_bytes()).unwrap(), curve());
    }

    #[test]
    fn start_is_first_control_point() {
        let traj = Trajectory::from_control_points(
            [Vec3::ONE, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO],
            [Vec3::new(0.0, 180.0, 0.0), Vec3::ZERO, Vec3::ZERO, Vec3::ZERO],
        );
        let (p, r) = traj.start();
        assert_eq!(p, Vec3::ONE);
        assert!((r.y - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Trajectory::load("definitely/not/here.txt"),
            Err(TrajectoryError::Io { .. })
        ));
    }
}
