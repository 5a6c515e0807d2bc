use tracing::*;
use super::{ClientId, Demand, LocId, ReqId, Time, Window};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RequestKind {
    Pickup,
    Delivery,
}

/// One half of a client: where and when the vehicle must stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: ReqId,
    pub client: ClientId,
    pub kind: RequestKind,
    pub window: Window,
    pub loc: LocId,
    pub service: Time,
    /// Positive for the pickup, negative for the delivery.
    pub load: Demand,
    derived: bool,
}

impl Request {
    pub fn new(id: ReqId, client: ClientId, kind: RequestKind, window: Window, loc: LocId, service: Time, load: Demand) -> Self {
        debug_assert_eq!(kind == RequestKind::Pickup, load > 0);
        Request { id, client, kind, window, loc, service, load, derived: false }
    }

    #[inline]
    pub fn is_pickup(&self) -> bool {
        self.kind == RequestKind::Pickup
    }

    #[inline]
    pub fn is_delivery(&self) -> bool {
        self.kind == RequestKind::Delivery
    }

    /// Whether this request's window was computed from its sibling's.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub(crate) fn relabel(&mut self, id: ReqId, client: ClientId) {
        self.id = id;
        self.client = client;
    }

    fn set_derived_window(&mut self, window: Window, horizon: Time) {
        assert!(!self.derived, "time window of request {} derived twice", self.id);
        // the stated window still applies
        let window = window.intersect(&self.window);
        assert!(window.is_valid(horizon), "derived window {:?} of request {} is inconsistent", window, self.id);
        self.window = window;
        self.derived = true;
    }
}

/// A pickup paired with its delivery.  The id is the client's position in the list of
/// clients sorted by pickup ET, and never changes once assigned.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Client {
    pub id: ClientId,
    pub pickup: ReqId,
    pub delivery: ReqId,
}

/// Derive the pickup window from a known delivery window.
///
/// Ride time is measured from the end of pickup service, so the pickup can start no
/// earlier than `delivery.et - mrt - service` and no later than the direct trip allows.
#[instrument(level="trace", skip(pickup, delivery), fields(pickup=%pickup.id))]
pub fn update_times_from_delivery(pickup: &mut Request, delivery: &Request, max_ride_time: Time, travel: Time, horizon: Time) {
    debug_assert!(pickup.is_pickup() && delivery.is_delivery());
    assert!(!delivery.derived, "client {} has both windows derived", pickup.client);
    let et = (delivery.window.et - max_ride_time - pickup.service).max(0);
    let lt = (delivery.window.lt - pickup.service - travel).min(horizon);
    trace!(et, lt, "pickup window from delivery");
    pickup.set_derived_window(Window::new(et, lt), horizon);
}

/// Derive the delivery window from a known pickup window.
#[instrument(level="trace", skip(delivery, pickup), fields(delivery=%delivery.id))]
pub fn update_times_from_pickup(delivery: &mut Request, pickup: &Request, max_ride_time: Time, travel: Time, horizon: Time) {
    debug_assert!(pickup.is_pickup() && delivery.is_delivery());
    assert!(!pickup.derived, "client {} has both windows derived", delivery.client);
    let et = (pickup.window.et + pickup.service + travel).min(horizon);
    let lt = (pickup.window.lt + pickup.service + max_ride_time).min(horizon);
    trace!(et, lt, "delivery window from pickup");
    delivery.set_derived_window(Window::new(et, lt), horizon);
}
