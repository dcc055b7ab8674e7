//! Spring-damper sag simulation for edges.
//!
//! Each unsettled edge relaxes towards a resting sag proportional to the
//! distance between its endpoints. The loop is driven by the host's frame
//! callback through `Simulation::tick` and stops itself once nothing moves.

use crate::model::{Edge, SagState};
use crate::space::WorldPoint;

pub const STIFFNESS: f32 = 0.02;
pub const DAMPING: f32 = 0.90;
/// Endpoint distance that yields one unit of gravity as sag.
pub const SAG_UNIT: f32 = 150.0;
pub const SETTLE_EPSILON: f32 = 0.01;
/// Velocity kick applied when an endpoint moves.
pub const PLUCK_IMPULSE: f32 = 2.0;

/// Hard caps so a bad gravity value cannot blow the curve off-screen.
pub const MAX_SAG: f32 = 2_000.0;
pub const MAX_VELOCITY: f32 = 200.0;
/// A single run longer than this force-settles everything.
pub const MAX_TICKS: u32 = 5_000;

pub fn resting_sag(start: WorldPoint, end: WorldPoint, gravity: f32) -> f32 {
    (end - start).length() / SAG_UNIT * gravity
}

/// One integration step towards `rest`.
pub fn step(state: &mut SagState, rest: f32) {
    let force = (rest - state.sag) * STIFFNESS;
    state.velocity = ((state.velocity + force) * DAMPING).clamp(-MAX_VELOCITY, MAX_VELOCITY);
    state.sag = (state.sag + state.velocity).clamp(-MAX_SAG, MAX_SAG);
    if state.velocity.abs() < SETTLE_EPSILON && (rest - state.sag).abs() < SETTLE_EPSILON {
        state.settled = true;
    }
}

pub fn any_unsettled(edges: &[Edge]) -> bool {
    edges.iter().any(|e| !e.physics.settled)
}

/// Start/stop bookkeeping for the sag loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Simulation {
    running: bool,
    ticks: u32,
}

impl Simulation {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Mark the loop as running. Returns `true` if it was stopped.
    pub fn start(&mut self) -> bool {
        let was_stopped = !self.running;
        if was_stopped {
            self.ticks = 0;
        }
        self.running = true;
        was_stopped
    }

    /// Advance every unsettled edge by one step. Returns whether the loop
    /// should keep running.
    pub fn tick(&mut self, edges: &mut [Edge], gravity: f32) -> bool {
        if !self.running {
            return false;
        }
        self.ticks += 1;
        let force_settle = self.ticks > MAX_TICKS;
        if force_settle {
            log::warn!("sag simulation exceeded {MAX_TICKS} ticks, settling");
        }

        for edge in edges.iter_mut() {
            if gravity <= 0.0 || !edge.waypoints.is_empty() {
                edge.physics = SagState::default();
                continue;
            }
            if edge.physics.settled {
                continue;
            }
            let Some((start, end)) = edge.endpoints() else {
                continue;
            };
            let rest = resting_sag(start, end, gravity);
            if force_settle {
                edge.physics = SagState {
                    sag: rest,
                    velocity: 0.0,
                    settled: true,
                };
            } else {
                step(&mut edge.physics, rest);
            }
        }

        // Edges still waiting for endpoints do not keep the loop alive.
        self.running = edges
            .iter()
            .any(|e| !e.physics.settled && e.endpoints().is_some());
        if !self.running {
            log::trace!("sag simulation settled after {} ticks", self.ticks);
        }
        self.running
    }

    /// Kick an edge after one of its endpoints moved. Returns `true` if the
    /// loop had to be (re)started, in which case the caller announces it.
    pub fn pluck(&mut self, edge: &mut Edge) -> bool {
        if !edge.waypoints.is_empty() {
            return false;
        }
        edge.physics.velocity = (edge.physics.velocity + PLUCK_IMPULSE).min(MAX_VELOCITY);
        edge.physics.settled = false;
        // A kick is fresh motion: the runaway budget counts from here.
        self.ticks = 0;
        self.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{EdgeId, NodeId};
    use crate::model::Handle;
    use pretty_assertions::assert_eq;

    fn edge(name: &str, dx: f32) -> Edge {
        let mut e = Edge::new(
            EdgeId::intern(name),
            NodeId::intern("ph_a"),
            Handle::Right,
            NodeId::intern("ph_b"),
            Handle::Left,
        )
        .unwrap();
        e.start = Some(WorldPoint::new(0.0, 0.0));
        e.end = Some(WorldPoint::new(dx, 0.0));
        e
    }

    #[test]
    fn resting_sag_scales_with_distance() {
        assert_eq!(resting_sag(WorldPoint::new(0.0, 0.0), WorldPoint::new(150.0, 0.0), 20.0), 20.0);
        assert_eq!(resting_sag(WorldPoint::new(0.0, 0.0), WorldPoint::new(300.0, 0.0), 20.0), 40.0);
    }

    #[test]
    fn single_step_matches_formula() {
        let mut s = SagState {
            sag: 0.0,
            velocity: 0.0,
            settled: false,
        };
        step(&mut s, 20.0);
        // force = 0.4, v = 0.36
        assert!((s.velocity - 0.36).abs() < 1e-6);
        assert!((s.sag - 0.36).abs() < 1e-6);
        assert!(!s.settled);
    }

    #[test]
    fn waypoint_edges_are_exempt() {
        let mut e = edge("ph_wp", 150.0);
        e.waypoints.push(WorldPoint::new(75.0, 40.0));
        let mut sim = Simulation::default();
        assert!(!sim.pluck(&mut e));
        sim.start();
        let mut edges = vec![e];
        assert!(!sim.tick(&mut edges, 20.0));
        assert_eq!(edges[0].physics, SagState::default());
    }

    #[test]
    fn unresolved_edges_do_not_keep_loop_alive() {
        let mut e = edge("ph_unres", 150.0);
        e.end = None;
        let mut sim = Simulation::default();
        sim.start();
        let mut edges = vec![e];
        assert!(!sim.tick(&mut edges, 20.0));
        assert!(!edges[0].physics.settled);
    }

    #[test]
    fn pluck_restarts_only_when_stopped() {
        let mut sim = Simulation::default();
        let mut e = edge("ph_pluck", 150.0);
        e.physics = SagState::default();
        assert!(sim.pluck(&mut e));
        assert_eq!(e.physics.velocity, 2.0);
        assert!(!e.physics.settled);
        assert!(!sim.pluck(&mut e));
        assert_eq!(e.physics.velocity, 4.0);
    }

    #[test]
    fn steady_plucking_never_force_settles() {
        let mut sim = Simulation::default();
        let mut edges = vec![edge("ph_held", 150.0)];
        for _ in 0..MAX_TICKS + 500 {
            sim.pluck(&mut edges[0]);
            assert!(sim.tick(&mut edges, 20.0));
        }
        assert_eq!(sim.ticks(), 1);
        assert!(!edges[0].physics.settled);
    }
}
