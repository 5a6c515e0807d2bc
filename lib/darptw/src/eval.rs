use std::ops::AddAssign;

use crate::config::Weights;
use crate::model::{Instance, Time, to_minutes};
use crate::route::Route;

/// Time aggregates of one route, in scaled units.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RouteMetrics {
    pub travel: Time,
    pub slack: Time,
    pub wait: Time,
    pub excess_ride: Time,
    pub ride: Time,
}

impl AddAssign<&RouteMetrics> for RouteMetrics {
    fn add_assign(&mut self, other: &RouteMetrics) {
        self.travel += other.travel;
        self.slack += other.slack;
        self.wait += other.wait;
        self.excess_ride += other.excess_ride;
        self.ride += other.ride;
    }
}

/// Solution-wide objective components, in minutes, and the weighted fitness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub travel: f64,
    pub slack: f64,
    pub wait: f64,
    pub excess_ride: f64,
    pub ride: f64,
    pub vehicles: usize,
    pub fitness: f64,
}

impl Evaluation {
    pub fn from_metrics(totals: &RouteMetrics, vehicles: usize, weights: &Weights) -> Self {
        let mut e = Evaluation {
            travel: to_minutes(totals.travel),
            slack: to_minutes(totals.slack),
            wait: to_minutes(totals.wait),
            excess_ride: to_minutes(totals.excess_ride),
            ride: to_minutes(totals.ride),
            vehicles,
            fitness: 0.0,
        };
        e.fitness = e.weighted(weights);
        e
    }

    /// Weighted sum of the components.  Lower is better.
    pub fn weighted(&self, w: &Weights) -> f64 {
        w.travel * self.travel
          + w.slack * self.slack
          + w.vehicles * self.vehicles as f64
          + w.excess_ride * self.excess_ride
          + w.wait * self.wait
          + w.ride * self.ride
    }
}

/// Evaluate every non-empty route that needs it and aggregate.
pub fn evaluate(inst: &Instance, routes: &mut [Route], weights: &Weights) -> Evaluation {
    let mut totals = RouteMetrics::default();
    let mut vehicles = 0;
    for route in routes.iter_mut().filter(|r| !r.is_void()) {
        totals += route.evaluate(inst);
        vehicles += 1;
    }
    Evaluation::from_metrics(&totals, vehicles, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use crate::model::round_time;

    #[test]
    fn empty_fleet_costs_nothing() {
        let inst = test_util::single_client();
        let mut routes = vec![Route::new(&inst), Route::new(&inst)];
        let e = evaluate(&inst, &mut routes, &Weights::default());
        assert_eq!(e.vehicles, 0);
        assert_eq!(e.fitness, 0.0);
    }

    #[test]
    fn weighted_sum() {
        let totals = RouteMetrics {
            travel: round_time(10.0),
            slack: round_time(2.0),
            wait: round_time(4.0),
            excess_ride: 0,
            ride: round_time(5.0),
        };
        let w = Weights { travel: 1.0, slack: 1.0, vehicles: 10.0, excess_ride: 100.0, wait: 0.5, ride: 2.0 };
        let e = Evaluation::from_metrics(&totals, 2, &w);
        assert_eq!(e.fitness, 10.0 + 2.0 + 20.0 + 0.0 + 2.0 + 10.0);
    }

    #[test]
    fn single_client_route() {
        let inst = test_util::single_client();
        let c = inst.client(crate::ClientId::from(0usize));
        let mut routes = vec![Route::from_requests(&inst, &[c.pickup, c.delivery]).unwrap()];
        let e = evaluate(&inst, &mut routes, &Weights::default());
        assert_eq!(e.vehicles, 1);
        assert_eq!(e.travel, 10.0);
        assert_eq!(e.ride, 5.0);
        assert_eq!(e.slack, 0.0);
        assert_eq!(e.wait, 0.0);
        assert!(routes[0].is_evaluated());
    }
}
