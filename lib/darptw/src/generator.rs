//! Randomised construction of complete feasible solutions.
use std::fmt;

use rand::prelude::*;
use tracing::*;

use crate::config::Search;
use crate::fleet::Fleet;
use crate::model::{ClientId, Instance};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ConstructionFailed {
    pub attempts: usize,
}

impl fmt::Display for ConstructionFailed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no feasible solution found after {} attempts", self.attempts)
    }
}

impl std::error::Error for ConstructionFailed {}

/// Put each client on some vehicle that accepts it, trying vehicles in random order.
/// Vehicles already holding an incompatible client are never tried.
fn assign(inst: &Instance, fleet: &mut Fleet, clients: &mut Vec<ClientId>, rng: &mut impl Rng) -> bool {
    clients.shuffle(rng);
    for &c in clients.iter() {
        let mut vehicles: Vec<usize> = (0..fleet.num_vehicles())
          .filter(|&v| fleet.can_host(inst, v, c))
          .collect();
        vehicles.shuffle(rng);
        if !vehicles.into_iter().any(|v| fleet.insert_client(inst, v, c, rng)) {
            trace!(%c, "no vehicle accepts client");
            return false;
        }
    }
    true
}

/// Clients with at least one incompatibility go first, then everybody else.  Any client
/// left without a vehicle discards the attempt and the next one starts from scratch.
#[instrument(level="debug", skip(search, rng))]
pub fn generate_solution(search: &Search, rng: &mut impl Rng) -> Result<Fleet, ConstructionFailed> {
    let inst = search.instance;
    let incompat = inst.incompatibility();
    let (constrained, free): (Vec<ClientId>, Vec<ClientId>) = inst.client_ids().partition(|&c| incompat.has_any(c));
    let attempts = search.budget.max_attempts;

    for attempt in 1..=attempts {
        let mut fleet = Fleet::new(inst);
        let mut constrained = constrained.clone();
        if !assign(inst, &mut fleet, &mut constrained, rng) {
            trace!(attempt, "constrained clients could not be placed");
            continue;
        }
        let mut free = free.clone();
        if !assign(inst, &mut fleet, &mut free, rng) {
            trace!(attempt, "remaining clients could not be placed");
            continue;
        }
        debug!(attempt, "solution constructed");
        return Ok(fleet);
    }
    warn!(attempts, "solution construction failed");
    Err(ConstructionFailed { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Budget;
    use crate::model::*;
    use crate::test_util;
    use proptest::prelude::*;

    #[test]
    fn bounded_failure() {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles: 2,
            capacity: 1,
            horizon: 100.0,
            max_ride_time: 30.0,
        }, (0.0, 0.0));
        b.add_client((1.0, 0.0), (2.0, 0.0), 2, 0.0, None, None);
        let inst = b.build();
        let search = Search::new(&inst).with_budget(Budget { max_attempts: 3, max_backtracks: 10 });
        let err = generate_solution(&search, &mut test_util::rng(0)).unwrap_err();
        assert_eq!(err, ConstructionFailed { attempts: 3 });
        assert_eq!(err.to_string(), "no feasible solution found after 3 attempts");
    }

    #[test]
    fn mutually_exclusive_clients_are_split() {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles: 2,
            capacity: 2,
            horizon: 200.0,
            max_ride_time: 30.0,
        }, (0.0, 0.0));
        // each must be delivered before the other can be picked up, at opposite corners
        b.add_client((0.0, 10.0), (10.0, 0.0), 1, 1.0, Some(Window::minutes(40.0, 45.0)), Some(Window::minutes(50.0, 60.0)));
        b.add_client((10.0, 0.0), (0.0, 10.0), 1, 1.0, Some(Window::minutes(40.0, 45.0)), Some(Window::minutes(50.0, 60.0)));
        let inst = b.build();
        let (x, y) = (ClientId::from(0usize), ClientId::from(1usize));
        assert!(inst.incompatibility().are_incompatible(x, y));

        let search = Search::new(&inst);
        for seed in 0..10 {
            let fleet = generate_solution(&search, &mut test_util::rng(seed)).unwrap();
            fleet.check_consistency(&inst);
            assert!(fleet.is_complete());
            assert_ne!(fleet.vehicle_of(x), fleet.vehicle_of(y));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn solutions_are_complete_and_consistent(seed in 0u64..1000, contested in any::<bool>()) {
            let inst = if contested { test_util::contested(5, 4) } else { test_util::grid(14, 14) };
            let search = Search::new(&inst);
            let fleet = generate_solution(&search, &mut test_util::rng(seed)).unwrap();
            prop_assert!(fleet.is_complete());
            fleet.check_consistency(&inst);
            for v in 0..fleet.num_vehicles() {
                for a in fleet.mask(v).iter() {
                    for b in fleet.mask(v).iter() {
                        prop_assert!(!inst.incompatibility().are_incompatible(a, b));
                    }
                }
            }
        }
    }
}
