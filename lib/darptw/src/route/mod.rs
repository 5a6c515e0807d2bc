//! A single vehicle's route: events stored in an arena and linked in visiting order, each
//! carrying its feasible service window, its chosen arrival and the load on board after it.
use std::fmt;

use tracing::*;

use crate::IntUid;
use crate::eval::RouteMetrics;
use crate::model::*;
use crate::Map;

mod edit;
mod search;

pub use search::{check_client_deletion, check_client_insertion, generate_route_by_insertion, insertion_candidates};

define_u32_index_type!(EventId);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventKind {
    StartDepot,
    Pickup,
    Delivery,
    StopDepot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub request: Option<ReqId>,
    pub prev: Option<EventId>,
    pub next: Option<EventId>,
    /// Chosen arrival, always `feasible.et`.
    pub at: Time,
    /// Feasible earliest and latest service start.
    pub feasible: Window,
    /// Forward window; only meaningful while an edit is being propagated.
    pub tentative: Window,
    /// The link to the next event contains idle time.
    pub slack: bool,
    /// Load on board after service.
    pub load: Demand,
}

impl Event {
    fn depot(kind: EventKind, window: Window) -> Self {
        Event {
            kind,
            request: None,
            prev: None,
            next: None,
            at: window.et,
            feasible: window,
            tentative: window,
            slack: false,
            load: 0,
        }
    }

    fn for_request(req: &Request) -> Self {
        let kind = match req.kind {
            RequestKind::Pickup => EventKind::Pickup,
            RequestKind::Delivery => EventKind::Delivery,
        };
        Event {
            kind,
            request: Some(req.id),
            prev: None,
            next: None,
            at: req.window.et,
            feasible: req.window,
            tentative: req.window,
            slack: false,
            load: 0,
        }
    }

    #[inline]
    pub fn is_depot(&self) -> bool {
        self.request.is_none()
    }

    pub fn client(&self, inst: &Instance) -> Option<ClientId> {
        self.request.map(|r| inst.request(r).client)
    }
}

#[inline]
fn location(inst: &Instance, ev: &Event) -> LocId {
    ev.request.map_or(inst.depot(), |r| inst.request(r).loc)
}

#[inline]
fn service(inst: &Instance, ev: &Event) -> Time {
    ev.request.map_or(0, |r| inst.request(r).service)
}

#[inline]
fn base_window(inst: &Instance, ev: &Event) -> Window {
    ev.request.map_or(inst.depot_window(), |r| inst.request(r).window)
}

#[inline]
fn load_delta(inst: &Instance, ev: &Event) -> Demand {
    ev.request.map_or(0, |r| inst.request(r).load)
}

/// Time between the service starts of two consecutive events when nobody waits.
#[inline]
pub(crate) fn leg(inst: &Instance, from: &Event, to: &Event) -> Time {
    service(inst, from) + inst.travel(location(inst, from), location(inst, to))
}

/// One stop of a rendered schedule, in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub kind: EventKind,
    pub client: Option<ClientId>,
    pub at: f64,
    pub earliest: f64,
    pub latest: f64,
    pub load: Demand,
}

#[derive(Clone)]
pub struct Route {
    events: Vec<Event>,
    free: Vec<EventId>,
    head: EventId,
    tail: EventId,
    len: usize,
    evaluated: bool,
    metrics: RouteMetrics,
    clients: Vec<ClientId>,
    swappable: Vec<EventId>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
          .entries(self.iter().map(|(_, ev)| (ev.request, ev.at)))
          .finish()
    }
}

pub struct RouteIter<'a> {
    route: &'a Route,
    cursor: Option<EventId>,
}

impl<'a> Iterator for RouteIter<'a> {
    type Item = (EventId, &'a Event);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let ev = self.route.event(id);
        self.cursor = ev.next;
        Some((id, ev))
    }
}

impl Route {
    /// An empty route: the start depot directly followed by the stop depot.
    pub fn new(inst: &Instance) -> Self {
        let window = inst.depot_window();
        let head = EventId::new(0);
        let tail = EventId::new(1);
        let mut start = Event::depot(EventKind::StartDepot, window);
        start.next = Some(tail);
        let mut stop = Event::depot(EventKind::StopDepot, window);
        stop.prev = Some(head);
        Route {
            events: vec![start, stop],
            free: Vec::new(),
            head,
            tail,
            len: 2,
            evaluated: false,
            metrics: RouteMetrics::default(),
            clients: Vec::new(),
            swappable: Vec::new(),
        }
    }

    /// Build a route visiting `requests` in the given order, or `None` if that order is
    /// infeasible.
    pub fn from_requests(inst: &Instance, requests: &[ReqId]) -> Option<Self> {
        let mut route = Route::new(inst);
        let head = route.head;
        let edit = edit::Edit::new(head, Vec::new(), requests.iter().map(|&r| (head, r)).collect());
        if route.apply(inst, &edit) {
            Some(route)
        } else {
            None
        }
    }

    #[inline]
    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.index()]
    }

    #[inline]
    pub fn head(&self) -> EventId {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> EventId {
        self.tail
    }

    pub fn iter(&self) -> RouteIter<'_> {
        RouteIter { route: self, cursor: Some(self.head) }
    }

    /// Event ids in visiting order, depots included.
    pub fn sequence(&self) -> Vec<EventId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Requests in visiting order.
    pub fn requests(&self) -> Vec<ReqId> {
        self.iter().filter_map(|(_, ev)| ev.request).collect()
    }

    /// Number of events, depots included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn num_clients(&self) -> usize {
        (self.len - 2) / 2
    }

    /// Only the two depots remain.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.len == 2
    }

    /// Locate the pickup and delivery events of `client`.
    pub fn find_client(&self, inst: &Instance, client: ClientId) -> Option<(EventId, EventId)> {
        let c = inst.client(client);
        let mut pickup = None;
        for (id, ev) in self.iter() {
            match ev.request {
                Some(r) if r == c.pickup => pickup = Some(id),
                Some(r) if r == c.delivery => return pickup.map(|p| (p, id)),
                _ => {}
            }
        }
        None
    }

    pub fn contains_client(&self, inst: &Instance, client: ClientId) -> bool {
        self.find_client(inst, client).is_some()
    }

    /// The link out of `id` has idle time even when both ends are served as late as
    /// their own windows allow.
    pub fn is_absolute_slack(&self, inst: &Instance, id: EventId) -> bool {
        let ev = self.event(id);
        if !ev.slack {
            return false;
        }
        match ev.next {
            Some(next) => {
                let next = self.event(next);
                base_window(inst, ev).lt + leg(inst, ev, next) < base_window(inst, next).et
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Metrics of the last evaluation, if the route has not changed since.
    pub fn metrics(&self) -> Option<&RouteMetrics> {
        if self.evaluated { Some(&self.metrics) } else { None }
    }

    /// Clients served, sorted.  Requires an evaluated route.
    pub fn clients(&self) -> &[ClientId] {
        assert!(self.evaluated, "route must be evaluated first");
        &self.clients
    }

    /// Events whose request may be exchanged with the next one without breaking a
    /// precedence rule.  Requires an evaluated route.
    pub fn swappable_points(&self) -> &[EventId] {
        assert!(self.evaluated, "route must be evaluated first");
        &self.swappable
    }

    /// Recompute the cached metrics, client list and swappable points.
    pub fn evaluate(&mut self, inst: &Instance) -> &RouteMetrics {
        if self.evaluated {
            return &self.metrics;
        }
        let prec = inst.precedence();
        let mut metrics = RouteMetrics::default();
        let mut clients = Vec::with_capacity(self.num_clients());
        let mut swappable = Vec::new();
        let mut picked_up: Map<ClientId, Time> = Map::default();
        let mut prev: Option<(EventId, &Event)> = None;

        for (id, ev) in self.iter() {
            if let Some((pid, p)) = prev {
                metrics.travel += inst.travel(location(inst, p), location(inst, ev));
                if p.slack {
                    metrics.slack += ev.at - p.at - leg(inst, p, ev);
                }
                if let (Some(a), Some(b)) = (p.request, ev.request) {
                    if prec.unordered(a, b) {
                        swappable.push(pid);
                    }
                }
            }
            if let Some(r) = ev.request {
                let req = inst.request(r);
                if req.is_pickup() {
                    metrics.wait += ev.at - req.window.et;
                    picked_up.insert(req.client, ev.at + req.service);
                    clients.push(req.client);
                } else {
                    let ride = ev.at - picked_up[&req.client];
                    metrics.ride += ride;
                    metrics.excess_ride += (ride - inst.max_ride_time).max(0);
                }
            }
            prev = Some((id, ev));
        }
        clients.sort();
        trace!(?metrics, "route evaluated");
        self.metrics = metrics;
        self.clients = clients;
        self.swappable = swappable;
        self.evaluated = true;
        &self.metrics
    }

    /// Same visiting order and the same schedule.
    pub fn is_same(&self, other: &Route) -> bool {
        self.len == other.len
          && self.iter().zip(other.iter()).all(|((_, a), (_, b))| {
            a.request == b.request && a.at == b.at && a.feasible == b.feasible && a.load == b.load && a.slack == b.slack
        })
    }

    pub fn stops(&self, inst: &Instance) -> Vec<StopRecord> {
        self.iter()
          .map(|(_, ev)| StopRecord {
              kind: ev.kind,
              client: ev.client(inst),
              at: to_minutes(ev.at),
              earliest: to_minutes(ev.feasible.et),
              latest: to_minutes(ev.feasible.lt),
              load: ev.load,
          })
          .collect()
    }

    /// Panics if links, windows, loads or arrivals are inconsistent.
    pub fn check_invariants(&self, inst: &Instance) {
        let mut count = 0;
        let mut prev: Option<(EventId, &Event)> = None;
        for (id, ev) in self.iter() {
            count += 1;
            assert!(ev.feasible.contains(ev.at), "event {} arrives outside its window", id);
            assert!(!ev.feasible.is_empty());
            assert!(ev.load >= 0 && ev.load <= inst.capacity(), "event {} overloaded", id);
            let base = base_window(inst, ev);
            assert!(base.et <= ev.feasible.et && ev.feasible.lt <= base.lt, "event {} outside its request window", id);
            match prev {
                None => assert_eq!(id, self.head),
                Some((pid, p)) => {
                    assert_eq!(ev.prev, Some(pid), "broken back link at {}", id);
                    assert_eq!(ev.load, p.load + load_delta(inst, ev));
                    let d = leg(inst, p, ev);
                    if p.slack {
                        assert_eq!(p.load, 0, "vehicle idles with passengers on board");
                        assert!(ev.at > p.at + d);
                    } else {
                        assert_eq!(ev.at, p.at + d, "rigid link {} -> {} is not tight", pid, id);
                    }
                }
            }
            prev = Some((id, ev));
        }
        assert_eq!(prev.map(|(id, _)| id), Some(self.tail));
        assert_eq!(count, self.len);
        assert_eq!(self.events.len(), self.len + self.free.len());
    }

    fn alloc(&mut self) -> EventId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                self.events.push(Event::depot(EventKind::StopDepot, Window::new(0, 0)));
                EventId::from(self.events.len() - 1)
            }
        }
    }

    fn release(&mut self, id: EventId) {
        debug_assert!(id != self.head && id != self.tail);
        let ev = &mut self.events[id.index()];
        ev.request = None;
        ev.prev = None;
        ev.next = None;
        self.free.push(id);
    }
}

#[cfg(test)]
mod tests;
