//! Waypoint approach for the simulated quadcopter.
//!
//! The quadcopter's flight controller chases a target dummy. We move the
//! dummy and step the simulation until the body (the "base") stops moving
//! close enough to the commanded pose. Long moves are split into legs so the
//! controller is never asked for a large jump.

use std::f64::consts::TAU;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ObjectHandle;
use crate::sim_api::{SimError, SimulatorApi};

/// Tolerances and leg sizes for the approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Position tolerance in meters once the waypoint is reached
    pub position_tolerance: f64,
    /// Orientation tolerance in radians once the waypoint is reached
    pub orientation_tolerance: f64,
    /// Position tolerance in meters for intermediate legs
    pub coarse_position_tolerance: f64,
    /// Orientation tolerance in radians for intermediate legs
    pub coarse_orientation_tolerance: f64,
    /// Longest position leg in meters
    pub max_position_leg: f64,
    /// Largest orientation leg in radians (15 degrees)
    pub max_orientation_leg: f64,
    /// Give up settling after this many steps. Unbounded when unset.
    pub max_settle_steps: Option<u64>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            position_tolerance: 0.05,
            orientation_tolerance: 0.02,
            coarse_position_tolerance: 0.2,
            coarse_orientation_tolerance: 0.1,
            max_position_leg: 0.5,
            max_orientation_leg: 0.2618,
            max_settle_steps: None,
        }
    }
}

impl ControlConfig {
    fn tolerances(&self, coarse: bool) -> (f64, f64) {
        if coarse {
            (self.coarse_position_tolerance, self.coarse_orientation_tolerance)
        } else {
            (self.position_tolerance, self.orientation_tolerance)
        }
    }
}

/// Scene objects that make up the controlled quadcopter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadcopterRig {
    /// Dummy the flight controller follows
    pub target: ObjectHandle,
    /// Body whose pose is measured
    pub base: ObjectHandle,
}

/// True when an orientation difference of norm `delta` is within `tolerance`,
/// counting a full turn as no difference.
pub fn orientation_within(delta: f64, tolerance: f64) -> bool {
    delta < tolerance || (delta - TAU).abs() < tolerance
}

/// Command the target to a pose and step until the base rests there.
///
/// Returns the number of simulation steps taken. `coarse` selects the
/// intermediate-leg tolerances.
pub fn settle<S: SimulatorApi + ?Sized>(
    sim: &mut S,
    rig: QuadcopterRig,
    config: &ControlConfig,
    position: &Vector3<f64>,
    orientation: &Vector3<f64>,
    coarse: bool,
) -> Result<u64, SimError> {
    let (pos_tol, ori_tol) = config.tolerances(coarse);

    let mut last_pos = sim.object_position(rig.base)?;
    let mut last_ori = sim.object_orientation(rig.base)?;

    sim.step()?;
    let mut steps: u64 = 1;

    sim.set_object_position(rig.target, position)?;
    sim.set_object_orientation(rig.target, orientation)?;

    loop {
        let pos = sim.object_position(rig.base)?;
        let ori = sim.object_orientation(rig.base)?;

        let at_rest = (pos - last_pos).norm() < pos_tol
            && orientation_within((ori - last_ori).norm(), ori_tol);
        let on_target = (position - pos).norm() < pos_tol
            && orientation_within((orientation - ori).norm(), ori_tol);

        if at_rest && on_target {
            debug!(steps, coarse, "Pose settled");
            return Ok(steps);
        }

        if let Some(max) = config.max_settle_steps {
            if steps >= max {
                return Err(SimError::NotConverged { steps });
            }
        }

        last_pos = pos;
        last_ori = ori;

        sim.step()?;
        steps += 1;
    }
}

/// Fly the quadcopter to `position`/`orientation` in bounded legs.
///
/// Position and orientation are locked independently once their remaining
/// error fits in a single leg. Legs settle with coarse tolerances; the final
/// settle, after both are locked, uses the fine ones.
pub fn fly_to<S: SimulatorApi + ?Sized>(
    sim: &mut S,
    rig: QuadcopterRig,
    config: &ControlConfig,
    position: &Vector3<f64>,
    orientation: &Vector3<f64>,
) -> Result<(), SimError> {
    let mut pos_locked = false;
    let mut ori_locked = false;
    let mut next_pos = Vector3::zeros();
    let mut next_ori = Vector3::zeros();
    let mut legs = 0u32;

    loop {
        let mut curr_pos = if pos_locked { next_pos } else { sim.object_position(rig.base)? };
        let curr_ori = if ori_locked { next_ori } else { sim.object_orientation(rig.base)? };

        let diff_pos = position - curr_pos;
        let diff_ori = orientation - curr_ori;
        let pos_err = diff_pos.norm();
        let ori_err = diff_ori.norm();

        if !pos_locked && pos_err < config.max_position_leg {
            pos_locked = true;
            settle(sim, rig, config, position, &curr_ori, !(pos_locked && ori_locked))?;
            curr_pos = *position;
            next_pos = *position;
        }

        if !ori_locked && orientation_within(ori_err, config.max_orientation_leg) {
            ori_locked = true;
            settle(sim, rig, config, &curr_pos, orientation, !(pos_locked && ori_locked))?;
            next_ori = *orientation;
        }

        if pos_locked && ori_locked {
            debug!(legs, "Waypoint reached");
            return Ok(());
        }

        if !pos_locked {
            next_pos = curr_pos + diff_pos / pos_err * config.max_position_leg;
        }
        if !ori_locked {
            next_ori = curr_ori + diff_ori / ori_err * config.max_orientation_leg;
        }

        settle(sim, rig, config, &next_pos, &next_ori, true)?;
        legs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeSimulator, BASE, TARGET};
    use crate::sim_api::resolve_handles;
    use std::f64::consts::PI;

    const RIG: QuadcopterRig = QuadcopterRig { target: TARGET, base: BASE };

    #[test]
    fn test_orientation_within_wraps_full_turn() {
        assert!(orientation_within(0.01, 0.02));
        assert!(orientation_within(TAU - 0.01, 0.02));
        assert!(!orientation_within(0.5, 0.02));
        assert!(!orientation_within(TAU - 0.5, 0.02));
    }

    #[test]
    fn test_tolerance_selection() {
        let config = ControlConfig::default();
        assert_eq!(config.tolerances(false), (0.05, 0.02));
        assert_eq!(config.tolerances(true), (0.2, 0.1));
    }

    #[test]
    fn test_settle_in_place_takes_one_step() {
        let pose = Vector3::new(1.0, 1.0, 1.0);
        let mut sim = FakeSimulator::new().with_pose(pose, Vector3::zeros());

        let steps = settle(&mut sim, RIG, &ControlConfig::default(), &pose, &Vector3::zeros(), false).unwrap();
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_settle_accepts_wrapped_orientation() {
        let mut sim = FakeSimulator::new();
        sim.gain = 1.0;
        sim.wrap_angles = true;
        let config = ControlConfig { max_settle_steps: Some(10), ..Default::default() };

        let steps = settle(
            &mut sim,
            RIG,
            &config,
            &Vector3::zeros(),
            &Vector3::new(0.0, 0.0, PI + 0.005),
            false,
        )
        .unwrap();
        assert_eq!(steps, 3);
    }

    #[test]
    fn test_settle_gives_up_after_max_steps() {
        let mut sim = FakeSimulator::new();
        sim.gain = 0.0;
        let config = ControlConfig { max_settle_steps: Some(20), ..Default::default() };

        let err = settle(&mut sim, RIG, &config, &Vector3::new(5.0, 0.0, 0.0), &Vector3::zeros(), true)
            .unwrap_err();
        assert!(matches!(err, SimError::NotConverged { steps: 20 }));
    }

    #[test]
    fn test_fly_to_reaches_waypoint_within_fine_tolerance() {
        let mut sim = FakeSimulator::new().with_pose(Vector3::new(0.0, 0.0, 0.16), Vector3::zeros());
        let config = ControlConfig::default();
        let goal_pos = Vector3::new(2.0, -1.0, 1.5);
        let goal_ori = Vector3::new(0.0, 0.0, 1.2);

        fly_to(&mut sim, RIG, &config, &goal_pos, &goal_ori).unwrap();

        assert!((sim.base_pos - goal_pos).norm() < config.position_tolerance);
        assert!((sim.base_ori - goal_ori).norm() < config.orientation_tolerance);
        assert_eq!(sim.target_pos, goal_pos);
    }

    #[test]
    fn test_fly_to_moves_in_bounded_legs() {
        let mut sim = FakeSimulator::new();
        let config = ControlConfig::default();

        fly_to(&mut sim, RIG, &config, &Vector3::new(4.0, 3.0, 0.0), &Vector3::zeros()).unwrap();

        let limit = config.max_position_leg + config.coarse_position_tolerance;
        let mut previous = Vector3::zeros();
        for commanded in &sim.commanded {
            assert!((commanded - previous).norm() <= limit, "leg too long: {commanded:?}");
            previous = *commanded;
        }
        assert!(sim.commanded.len() >= 8);
    }

    #[test]
    fn test_fly_to_propagates_step_errors() {
        let mut sim = FakeSimulator::new();
        sim.fail_at_step = Some(3);

        let err = fly_to(&mut sim, RIG, &ControlConfig::default(), &Vector3::new(3.0, 0.0, 0.0), &Vector3::zeros())
            .unwrap_err();
        assert!(matches!(err, SimError::Transport(_)));
    }

    #[test]
    fn test_resolve_handles_looks_up_each_name_once() {
        let mut sim = FakeSimulator::new();

        let handles = resolve_handles(&mut sim, ["/target", "/Quadcopter/base", "/target"]).unwrap();

        assert_eq!(handles.len(), 2);
        assert_eq!(handles["/target"], TARGET);
        assert_eq!(sim.lookups, vec!["/target", "/Quadcopter/base"]);
    }

    #[test]
    fn test_resolve_handles_unknown_name() {
        let mut sim = FakeSimulator::new();
        let err = resolve_handles(&mut sim, ["/missing"]).unwrap_err();
        assert!(matches!(err, SimError::Remote { .. }));
    }
}
