use std::cmp::Reverse;

use rand::prelude::*;
use tracing::*;

use crate::config::Search;
use crate::eval::Evaluation;
use crate::fleet::Fleet;
use crate::mask::ClientMask;
use crate::route;
use super::Genome;

/// A solution encoded directly as its routes.  The fleet's owner table doubles as the
/// client to vehicle lookup.
#[derive(Debug, Clone)]
pub struct RouteArrayGenome {
    fleet: Fleet,
    eval: Evaluation,
}

impl RouteArrayGenome {
    /// Three stages: copy about a third of `donor`'s routes, fill free vehicles with
    /// `other`'s fullest routes minus clients already placed, then insert whoever is
    /// left anywhere it fits.  Only the last stage can fail.
    fn recombine(search: &Search, donor: &Fleet, other: &Fleet, rng: &mut impl Rng) -> Option<Fleet> {
        let inst = search.instance;
        let slots = inst.num_vehicles();
        let mut child = Fleet::new(inst);
        let mut placed = ClientMask::new(inst.num_clients());
        let mut slot = 0;

        let mut donated: Vec<usize> = donor.used_vehicles().collect();
        donated.shuffle(rng);
        let keep = (donated.len() + 2) / 3;
        for &v in &donated[..keep] {
            child.place_route(inst, slot, donor.route(v).clone());
            placed.or_assign(donor.mask(v));
            slot += 1;
        }

        let mut fillers: Vec<usize> = other.used_vehicles().collect();
        fillers.sort_by_key(|&v| Reverse(other.mask(v).count()));
        for v in fillers {
            if slot == slots {
                break;
            }
            let mut r = other.route(v).clone();
            let duplicates = other.mask(v).and(&placed);
            let trimmed = duplicates.iter().all(|c| route::check_client_deletion(inst, &mut r, c));
            if !trimmed || r.is_void() {
                continue;
            }
            placed.or_assign(&other.mask(v).minus(&duplicates));
            child.place_route(inst, slot, r);
            slot += 1;
        }

        let mut missing = child.unassigned();
        missing.shuffle(rng);
        for c in missing {
            let mut vehicles: Vec<usize> = (0..slots).filter(|&v| child.can_host(inst, v, c)).collect();
            vehicles.shuffle(rng);
            if !vehicles.into_iter().any(|v| child.insert_client(inst, v, c, rng)) {
                trace!(%c, "client left over after recombination");
                return None;
            }
        }
        Some(child)
    }

    fn child(search: &Search, donor: &Self, other: &Self, rng: &mut impl Rng) -> Self {
        for attempt in 0..search.ga.crossover_retries {
            if let Some(fleet) = Self::recombine(search, &donor.fleet, &other.fleet, rng) {
                trace!(attempt, "recombination succeeded");
                return Self::from_fleet(search, fleet);
            }
        }
        donor.clone()
    }

    fn reevaluate(&mut self, search: &Search) {
        self.eval = self.fleet.evaluate(search.instance, &search.weights);
    }
}

impl Genome for RouteArrayGenome {
    fn from_fleet(search: &Search, mut fleet: Fleet) -> Self {
        let eval = fleet.evaluate(search.instance, &search.weights);
        RouteArrayGenome { fleet, eval }
    }

    fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    fn evaluation(&self) -> &Evaluation {
        &self.eval
    }

    #[instrument(level="trace", skip(search, a, b, rng))]
    fn crossover(search: &Search, a: &Self, b: &Self, rng: &mut impl Rng) -> (Self, Self) {
        (Self::child(search, a, b, rng), Self::child(search, b, a, rng))
    }

    fn cluster_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool {
        let changed = super::cluster_mutation(search, &mut self.fleet, rng);
        if changed {
            self.reevaluate(search);
        }
        changed
    }

    fn route_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool {
        let changed = super::route_mutation(search, &mut self.fleet, rng);
        if changed {
            self.reevaluate(search);
        }
        changed
    }
}
