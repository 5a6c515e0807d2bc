//! Candidate solutions of the genetic search.
//!
//! Both encodings wrap a [`Fleet`] and only ever hold feasible schedules: every operator
//! works through the route engine and drops changes it cannot make feasibly.
use rand::prelude::*;
use tracing::*;

use crate::config::Search;
use crate::eval::Evaluation;
use crate::fleet::{Fleet, RouteRecord};
use crate::generator::{generate_solution, ConstructionFailed};
use crate::model::Instance;

mod gene_list;
mod route_array;

pub use gene_list::{Gene, GeneListGenome};
pub use route_array::RouteArrayGenome;

pub trait Genome: Clone + Send + Sync + Sized {
    fn from_fleet(search: &Search, fleet: Fleet) -> Self;

    fn fleet(&self) -> &Fleet;

    fn evaluation(&self) -> &Evaluation;

    /// Weighted objective, lower is better.
    fn fitness(&self) -> f64 {
        self.evaluation().fitness
    }

    /// Two children, each falling back to a copy of its first parent when recombination
    /// keeps failing.
    fn crossover(search: &Search, a: &Self, b: &Self, rng: &mut impl Rng) -> (Self, Self);

    /// Move clients to other vehicles.  Returns whether anything changed.
    fn cluster_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool;

    /// Reorder adjacent stops within routes.  Returns whether anything changed.
    fn route_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool;

    fn random(search: &Search, rng: &mut impl Rng) -> Result<Self, ConstructionFailed> {
        generate_solution(search, rng).map(|fleet| Self::from_fleet(search, fleet))
    }

    fn mutate(&mut self, search: &Search, rng: &mut impl Rng) {
        self.cluster_mutation(search, rng);
        self.route_mutation(search, rng);
    }

    fn render(&self, inst: &Instance) -> Vec<RouteRecord> {
        self.fleet().render(inst)
    }
}

/// With probability `mutation_rate` per client, move it to the first other vehicle (in
/// random order) that can take it.
pub(crate) fn cluster_mutation(search: &Search, fleet: &mut Fleet, rng: &mut impl Rng) -> bool {
    let inst = search.instance;
    let mut changed = false;
    for c in inst.client_ids() {
        if !rng.gen_bool(search.ga.mutation_rate) {
            continue;
        }
        let from = fleet.vehicle_of(c);
        let mut targets: Vec<usize> = (0..fleet.num_vehicles())
          .filter(|&v| Some(v) != from && fleet.can_host(inst, v, c))
          .collect();
        targets.shuffle(rng);
        if targets.into_iter().any(|v| fleet.move_client(inst, c, v, rng)) {
            changed = true;
        }
    }
    trace!(changed, "cluster mutation");
    changed
}

/// With probability `mutation_rate` per route, swap a random swappable point with its
/// successor.
pub(crate) fn route_mutation(search: &Search, fleet: &mut Fleet, rng: &mut impl Rng) -> bool {
    let inst = search.instance;
    fleet.refresh(inst);
    let mut changed = false;
    for v in 0..fleet.num_vehicles() {
        if !rng.gen_bool(search.ga.mutation_rate) {
            continue;
        }
        let point = match fleet.route(v).swappable_points().choose(rng) {
            Some(&p) => p,
            None => continue,
        };
        if fleet.try_swap(inst, v, point) {
            changed = true;
        }
    }
    trace!(changed, "route mutation");
    changed
}
