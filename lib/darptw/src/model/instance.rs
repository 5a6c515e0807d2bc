use tracing::{debug, instrument};

use crate::IntUid;
use crate::precedence::{Incompatibility, Precedence};
use super::*;

/// Global scalars of an instance, in minutes where they are times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceParams {
    pub vehicles: usize,
    pub capacity: Demand,
    pub horizon: f64,
    pub max_ride_time: f64,
}

/// One stop of a client as supplied by a loader.  `window` is `None` when the input leaves
/// that side of the client to be derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopSpec {
    pub at: (f64, f64),
    pub service: f64,
    pub window: Option<Window>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientSpec {
    pub pickup: StopSpec,
    pub delivery: StopSpec,
    pub load: Demand,
}

#[derive(Debug, Clone, Copy)]
struct PendingClient {
    spec: ClientSpec,
    pickup_loc: LocId,
    delivery_loc: LocId,
}

/// Collects locations and clients, then freezes them into an [`Instance`].
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    id: String,
    params: InstanceParams,
    geography: Geography,
    depot: LocId,
    pending: Vec<PendingClient>,
}

impl InstanceBuilder {
    pub fn new(params: InstanceParams, depot: (f64, f64)) -> Self {
        assert!(params.vehicles > 0, "an instance needs at least one vehicle");
        assert!(params.capacity > 0, "vehicle capacity must be positive");
        assert!(params.horizon > 0.0 && params.max_ride_time >= 0.0);
        let mut geography = Geography::new();
        let depot = geography.add_location(depot.0, depot.1);
        InstanceBuilder { id: String::new(), params, geography, depot, pending: Vec::new() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn add_client_spec(&mut self, spec: ClientSpec) {
        assert!(spec.load > 0, "client load must be positive");
        let pickup_loc = self.geography.add_location(spec.pickup.at.0, spec.pickup.at.1);
        let delivery_loc = self.geography.add_location(spec.delivery.at.0, spec.delivery.at.1);
        self.pending.push(PendingClient { spec, pickup_loc, delivery_loc });
    }

    /// Shorthand for the common case of equal service times at both ends.
    pub fn add_client(&mut self, pickup: (f64, f64), delivery: (f64, f64), load: Demand, service: f64,
                      pickup_window: Option<Window>, delivery_window: Option<Window>) {
        self.add_client_spec(ClientSpec {
            pickup: StopSpec { at: pickup, service, window: pickup_window },
            delivery: StopSpec { at: delivery, service, window: delivery_window },
            load,
        })
    }

    #[instrument(level="debug", skip(self), fields(id=%self.id, clients=self.pending.len()))]
    pub fn build(self) -> Instance {
        let InstanceBuilder { id, params, mut geography, depot, pending } = self;
        geography.build_matrix();
        let horizon = round_time(params.horizon);
        let max_ride_time = round_time(params.max_ride_time);
        let full = Window::new(0, horizon);

        let mut pairs: Vec<(Request, Request)> = pending.iter()
            .map(|pc| {
                let placeholder = ClientId::from(0usize);
                let ReqIdPair(p_id, d_id) = ReqIdPair::of(placeholder);
                let stated = |s: &StopSpec| s.window.map(|w| w.intersect(&full)).unwrap_or(full);
                let mut p = Request::new(p_id, placeholder, RequestKind::Pickup, stated(&pc.spec.pickup),
                                         pc.pickup_loc, round_time(pc.spec.pickup.service), pc.spec.load);
                let mut d = Request::new(d_id, placeholder, RequestKind::Delivery, stated(&pc.spec.delivery),
                                         pc.delivery_loc, round_time(pc.spec.delivery.service), -pc.spec.load);
                let travel = geography.travel(p.loc, d.loc);
                match given_side(&pc.spec, horizon) {
                    RequestKind::Pickup => update_times_from_pickup(&mut d, &p, max_ride_time, travel, horizon),
                    RequestKind::Delivery => update_times_from_delivery(&mut p, &d, max_ride_time, travel, horizon),
                }
                (p, d)
            })
            .collect();

        // stable, so ties keep loader order
        pairs.sort_by_key(|(p, _)| (p.window.et, p.window.lt));

        let mut requests = Vec::with_capacity(pairs.len() * 2);
        let mut clients = Vec::with_capacity(pairs.len());
        for (c, (mut p, mut d)) in pairs.into_iter().enumerate() {
            let c = ClientId::from(c);
            let ReqIdPair(p_id, d_id) = ReqIdPair::of(c);
            p.relabel(p_id, c);
            d.relabel(d_id, c);
            requests.push(p);
            requests.push(d);
            clients.push(Client { id: c, pickup: p_id, delivery: d_id });
        }

        let precedence = Precedence::analyze(&requests, &geography);
        let incompatibility = Incompatibility::derive(&precedence, &requests, clients.len());
        debug!(locations=geography.len(), requests=requests.len(), "instance built");

        Instance {
            id,
            params,
            horizon,
            max_ride_time,
            depot,
            geography,
            requests,
            clients,
            precedence,
            incompatibility,
        }
    }
}

struct ReqIdPair(ReqId, ReqId);

impl ReqIdPair {
    #[inline]
    fn of(c: ClientId) -> Self {
        ReqIdPair(ReqId::from(2 * c.index()), ReqId::from(2 * c.index() + 1))
    }
}

/// The side whose window the input determines: the one narrower than the horizon, the
/// narrower of the two if both are, the pickup otherwise.
fn given_side(spec: &ClientSpec, horizon: Time) -> RequestKind {
    let width = |w: Option<Window>| w.map(|w| w.width()).unwrap_or(horizon);
    if width(spec.delivery.window) < width(spec.pickup.window) {
        RequestKind::Delivery
    } else {
        RequestKind::Pickup
    }
}

/// The immutable context every component reads: geography, requests and clients, and the
/// precedence and incompatibility tables derived from them.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: String,
    pub params: InstanceParams,
    pub horizon: Time,
    pub max_ride_time: Time,
    depot: LocId,
    geography: Geography,
    requests: Vec<Request>,
    clients: Vec<Client>,
    precedence: Precedence,
    incompatibility: Incompatibility,
}

impl Instance {
    #[inline]
    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    #[inline]
    pub fn num_vehicles(&self) -> usize {
        self.params.vehicles
    }

    #[inline]
    pub fn capacity(&self) -> Demand {
        self.params.capacity
    }

    #[inline]
    pub fn depot(&self) -> LocId {
        self.depot
    }

    #[inline]
    pub fn depot_window(&self) -> Window {
        Window::new(0, self.horizon)
    }

    #[inline]
    pub fn request(&self, r: ReqId) -> &Request {
        &self.requests[r.index()]
    }

    #[inline]
    pub fn client(&self, c: ClientId) -> &Client {
        &self.clients[c.index()]
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn client_ids(&self) -> impl Iterator<Item=ClientId> + '_ {
        self.clients.iter().map(|c| c.id)
    }

    #[inline]
    pub fn travel(&self, from: LocId, to: LocId) -> Time {
        self.geography.travel(from, to)
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn precedence(&self) -> &Precedence {
        &self.precedence
    }

    pub fn incompatibility(&self) -> &Incompatibility {
        &self.incompatibility
    }
}
