use std::cmp::{max, min};

use rand::prelude::*;
use tracing::{debug, instrument, trace};

use super::*;

/// Inclusive range of gaps (gap `g` lies right after `seq[g]`) where `r` can go without
/// breaking a precedence rule against the events already on the route.
fn precedence_range(inst: &Instance, route: &Route, seq: &[EventId], r: ReqId) -> Option<(usize, usize)> {
    let prec = inst.precedence();
    let mut lo = 0;
    let mut hi = seq.len() - 2;
    for (k, &id) in seq.iter().enumerate() {
        if let Some(other) = route.event(id).request {
            if prec.forbids(other, r) {
                // `other` must stay after `r`
                hi = min(hi, k - 1);
            }
            if prec.forbids(r, other) {
                lo = max(lo, k);
            }
        }
    }
    if lo <= hi { Some((lo, hi)) } else { None }
}

/// Every `(pickup_after, delivery_after)` pair worth trying for `client`.
///
/// The pickup and delivery must each respect precedence against the route's events, the
/// delivery may not come before the pickup, and no absolutely idle link may separate them
/// (the vehicle would have to wait with the client on board).
pub fn insertion_candidates(inst: &Instance, route: &Route, client: ClientId) -> Vec<(EventId, EventId)> {
    let c = inst.client(client);
    let seq = route.sequence();
    let (plo, phi) = match precedence_range(inst, route, &seq, c.pickup) {
        Some(r) => r,
        None => return Vec::new(),
    };
    let (dlo, dhi) = match precedence_range(inst, route, &seq, c.delivery) {
        Some(r) => r,
        None => return Vec::new(),
    };

    let last_gap = seq.len() - 2;
    let mut bounds = vec![0];
    bounds.extend((1..last_gap).filter(|&g| route.is_absolute_slack(inst, seq[g])));
    bounds.push(last_gap);

    let mut gaps = Vec::new();
    for zone in bounds.windows(2) {
        let (zs, ze) = (zone[0], zone[1]);
        for gp in max(plo, zs)..=min(phi, ze) {
            for gd in max(max(gp, dlo), zs)..=min(dhi, ze) {
                gaps.push((gp, gd));
            }
        }
    }
    gaps.sort_unstable();
    gaps.dedup();
    gaps.into_iter().map(|(gp, gd)| (seq[gp], seq[gd])).collect()
}

/// Try the candidate positions of `client` in random order and keep the first feasible
/// one.
pub fn check_client_insertion(inst: &Instance, route: &mut Route, client: ClientId, rng: &mut impl Rng) -> bool {
    debug_assert!(!route.contains_client(inst, client));
    let mut candidates = insertion_candidates(inst, route, client);
    candidates.shuffle(rng);
    for (pickup_after, delivery_after) in candidates {
        if route.try_insertion(inst, client, pickup_after, delivery_after) {
            return true;
        }
    }
    trace!(%client, "no feasible insertion");
    false
}

pub fn check_client_deletion(inst: &Instance, route: &mut Route, client: ClientId) -> bool {
    match route.find_client(inst, client) {
        Some((pickup, delivery)) => route.try_deletion(inst, pickup, delivery),
        None => panic!("client {} is not on this route", client),
    }
}

fn backtrack(inst: &Instance, route: &Route, remaining: &[ClientId], budget: &mut usize, rng: &mut impl Rng) -> Option<Route> {
    if remaining.is_empty() {
        return Some(route.clone());
    }
    let mut order: Vec<usize> = (0..remaining.len()).collect();
    order.shuffle(rng);
    for i in order {
        let client = remaining[i];
        let mut candidates = insertion_candidates(inst, route, client);
        candidates.shuffle(rng);
        for (pickup_after, delivery_after) in candidates {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
            let mut attempt = route.clone();
            if !attempt.try_insertion(inst, client, pickup_after, delivery_after) {
                continue;
            }
            let rest: Vec<ClientId> = remaining.iter().enumerate()
              .filter(|&(j, _)| j != i)
              .map(|(_, &c)| c)
              .collect();
            if let Some(done) = backtrack(inst, &attempt, &rest, budget, rng) {
                return Some(done);
            }
        }
    }
    None
}

/// Build a route serving exactly `clients`, trying insertion orders and positions at
/// random and backtracking on dead ends.  Gives up after `budget` insertion attempts.
#[instrument(level="debug", skip(inst, clients, rng), fields(clients=clients.len()))]
pub fn generate_route_by_insertion(inst: &Instance, clients: &[ClientId], budget: usize, rng: &mut impl Rng) -> Option<Route> {
    let mut budget = budget;
    let route = backtrack(inst, &Route::new(inst), clients, &mut budget, rng);
    match &route {
        Some(_) => trace!(budget_left = budget, "route generated"),
        None => debug!("route generation failed"),
    }
    route
}
