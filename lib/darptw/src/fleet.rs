//! One route and one client mask per vehicle, kept in lockstep.
use rand::Rng;
use tracing::*;

use crate::IntUid;
use crate::config::Weights;
use crate::eval::{self, Evaluation};
use crate::mask::ClientMask;
use crate::model::{ClientId, Instance};
use crate::route::{self, EventId, Route, StopRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub vehicle: usize,
    pub clients: Vec<ClientId>,
    pub stops: Vec<StopRecord>,
}

/// `masks[v]` contains `c` iff `routes[v]` serves `c` iff `owner[c] == Some(v)`.
#[derive(Debug, Clone)]
pub struct Fleet {
    routes: Vec<Route>,
    masks: Vec<ClientMask>,
    owner: Vec<Option<usize>>,
}

impl Fleet {
    pub fn new(inst: &Instance) -> Self {
        let n = inst.num_clients();
        Fleet {
            routes: vec![Route::new(inst); inst.num_vehicles()],
            masks: vec![ClientMask::new(n); inst.num_vehicles()],
            owner: vec![None; n],
        }
    }

    #[inline]
    pub fn num_vehicles(&self) -> usize {
        self.routes.len()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[inline]
    pub fn route(&self, v: usize) -> &Route {
        &self.routes[v]
    }

    pub fn masks(&self) -> &[ClientMask] {
        &self.masks
    }

    #[inline]
    pub fn mask(&self, v: usize) -> &ClientMask {
        &self.masks[v]
    }

    #[inline]
    pub fn vehicle_of(&self, c: ClientId) -> Option<usize> {
        self.owner[c.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.owner.iter().all(Option::is_some)
    }

    pub fn unassigned(&self) -> Vec<ClientId> {
        self.owner.iter().enumerate()
          .filter(|(_, o)| o.is_none())
          .map(|(c, _)| ClientId::from(c))
          .collect()
    }

    /// Vehicles currently serving at least one client.
    pub fn used_vehicles(&self) -> impl Iterator<Item=usize> + '_ {
        self.routes.iter().enumerate().filter(|(_, r)| !r.is_void()).map(|(v, _)| v)
    }

    /// No client on `v` is incompatible with `c`.
    pub fn can_host(&self, inst: &Instance, v: usize, c: ClientId) -> bool {
        !self.masks[v].intersects(inst.incompatibility().mask(c))
    }

    /// Insert an unassigned client into vehicle `v`.
    pub fn insert_client(&mut self, inst: &Instance, v: usize, c: ClientId, rng: &mut impl Rng) -> bool {
        assert!(self.owner[c.index()].is_none(), "client {} is already assigned", c);
        if !self.can_host(inst, v, c) {
            return false;
        }
        if route::check_client_insertion(inst, &mut self.routes[v], c, rng) {
            self.masks[v].insert(c);
            self.owner[c.index()] = Some(v);
            true
        } else {
            false
        }
    }

    /// Remove an assigned client from its vehicle.
    pub fn remove_client(&mut self, inst: &Instance, c: ClientId) -> bool {
        let v = match self.owner[c.index()] {
            Some(v) => v,
            None => panic!("client {} is not assigned", c),
        };
        if route::check_client_deletion(inst, &mut self.routes[v], c) {
            self.masks[v].remove(c);
            self.owner[c.index()] = None;
            true
        } else {
            false
        }
    }

    /// Move an assigned client to vehicle `to`.  Both routes are left untouched unless the
    /// deletion and the insertion succeed.
    pub fn move_client(&mut self, inst: &Instance, c: ClientId, to: usize, rng: &mut impl Rng) -> bool {
        let from = match self.owner[c.index()] {
            Some(v) => v,
            None => panic!("client {} is not assigned", c),
        };
        if from == to || !self.can_host(inst, to, c) {
            return false;
        }
        let mut source = self.routes[from].clone();
        if !route::check_client_deletion(inst, &mut source, c) {
            return false;
        }
        let mut target = self.routes[to].clone();
        if !route::check_client_insertion(inst, &mut target, c, rng) {
            return false;
        }
        self.routes[from] = source;
        self.routes[to] = target;
        self.masks[from].remove(c);
        self.masks[to].insert(c);
        self.owner[c.index()] = Some(to);
        trace!(%c, from, to, "client moved");
        true
    }

    /// Install a complete route on an empty vehicle.
    pub fn place_route(&mut self, inst: &Instance, v: usize, route: Route) {
        assert!(self.routes[v].is_void(), "vehicle {} already has a route", v);
        for r in route.requests() {
            let req = inst.request(r);
            if req.is_pickup() {
                assert!(self.owner[req.client.index()].is_none(), "client {} is already assigned", req.client);
                self.masks[v].insert(req.client);
                self.owner[req.client.index()] = Some(v);
            }
        }
        self.routes[v] = route;
    }

    /// Exchange the request at `point` with its successor on vehicle `v`.
    pub fn try_swap(&mut self, inst: &Instance, v: usize, point: EventId) -> bool {
        self.routes[v].try_swap(inst, point)
    }

    /// Evaluate routes whose cache is stale.
    pub fn refresh(&mut self, inst: &Instance) {
        for r in &mut self.routes {
            r.evaluate(inst);
        }
    }

    pub fn evaluate(&mut self, inst: &Instance, weights: &Weights) -> Evaluation {
        eval::evaluate(inst, &mut self.routes, weights)
    }

    /// Panics on any disagreement between routes, masks and the owner table.
    pub fn check_consistency(&self, inst: &Instance) {
        for (v, (route, mask)) in self.routes.iter().zip(&self.masks).enumerate() {
            route.check_invariants(inst);
            let served = ClientMask::from_members(inst.num_clients(), route.requests().into_iter()
              .map(|r| inst.request(r))
              .filter(|req| req.is_pickup())
              .map(|req| req.client));
            assert_eq!(&served, mask, "mask of vehicle {} out of sync", v);
            for c in mask.iter() {
                assert_eq!(self.owner[c.index()], Some(v));
                assert!(!mask.intersects(inst.incompatibility().mask(c)), "incompatible clients share vehicle {}", v);
            }
        }
        for (c, o) in self.owner.iter().enumerate() {
            if let Some(v) = o {
                assert!(self.masks[*v].contains(ClientId::from(c)));
            }
        }
    }

    pub fn render(&self, inst: &Instance) -> Vec<RouteRecord> {
        self.routes.iter().zip(&self.masks).enumerate()
          .map(|(vehicle, (route, mask))| RouteRecord {
              vehicle,
              clients: mask.to_vec(),
              stops: route.stops(inst),
          })
          .collect()
    }
}
