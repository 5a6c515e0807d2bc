use std::borrow::Cow;
use crate::{Error, Result};

pub type Time = f64;
pub type Demand = isize;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> Self;
}

/// Instance data exactly as it appears in a Cordeau-style DARP file.
///
/// Node `0` is the depot, nodes `1..=n` are pickups and node `i + n` is the delivery
/// paired with pickup `i`.  Some files repeat the depot as node `2n + 1`; it is kept
/// in the vectors but never treated as a request.
#[derive(Debug, Clone, PartialEq)]
pub struct DarpRaw {
  pub num_vehicles: usize,
  pub num_requests: usize,
  pub max_route_time: Time,
  pub vehicle_capacity: usize,
  pub max_ride_time: Time,
  pub coords: Vec<(f64, f64)>,
  pub service_time: Vec<Time>,
  pub demand: Vec<Demand>,
  pub tw_start: Vec<Time>,
  pub tw_end: Vec<Time>,
}

impl DarpRaw {
  #[inline]
  pub fn pickup(&self, request: usize) -> usize {
    debug_assert!(request < self.num_requests);
    request + 1
  }

  #[inline]
  pub fn delivery(&self, request: usize) -> usize {
    debug_assert!(request < self.num_requests);
    request + 1 + self.num_requests
  }

  /// End of the planning horizon, taken from the depot's time window.
  pub fn horizon(&self) -> Time {
    self.tw_end[0]
  }

  /// Structural checks the parser cannot express in the grammar.
  pub fn validate(&self) -> Result<()> {
    let n = self.num_requests;
    let found = self.coords.len();
    if found != 2 * n + 1 && found != 2 * n + 2 {
      return Err(Error::NodeCount { expected: 2 * n + 2, found }.into());
    }
    if self.demand[0] != 0 {
      return Err(Error::DepotNotFirst.into());
    }
    for r in 0..n {
      let (p, d) = (self.pickup(r), self.delivery(r));
      if self.demand[p] <= 0 || self.demand[p] + self.demand[d] != 0 {
        return Err(Error::UnbalancedDemand { pickup: p, delivery: d }.into());
      }
    }
    for node in 0..found {
      if self.tw_start[node] > self.tw_end[node] {
        return Err(Error::EmptyTimeWindow { node }.into());
      }
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn tiny() -> DarpRaw {
    DarpRaw {
      num_vehicles: 1,
      num_requests: 1,
      max_route_time: 480.0,
      vehicle_capacity: 3,
      max_ride_time: 90.0,
      coords: vec![(0.0, 0.0), (1.0, 0.0), (4.0, 4.0)],
      service_time: vec![0.0, 3.0, 3.0],
      demand: vec![0, 1, -1],
      tw_start: vec![0.0, 0.0, 60.0],
      tw_end: vec![1440.0, 1440.0, 75.0],
    }
  }

  #[test]
  fn node_indices() {
    let raw = tiny();
    assert_eq!(raw.pickup(0), 1);
    assert_eq!(raw.delivery(0), 2);
    assert_eq!(raw.horizon(), 1440.0);
  }

  #[test]
  fn validate_ok() {
    tiny().validate().unwrap();
  }

  #[test]
  fn validate_unbalanced() {
    let mut raw = tiny();
    raw.demand[2] = -2;
    let err = raw.validate().unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::UnbalancedDemand { pickup: 1, delivery: 2 }));
  }
}
