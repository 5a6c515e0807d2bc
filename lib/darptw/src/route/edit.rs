//! Structural edits of a route.
//!
//! An edit is described relative to the current events: an anchor after which things
//! change, events to skip and requests to insert after given events.  Forward windows are
//! propagated from the start of the anchor's rigid block into a draft, stopping as soon as
//! the draft reconnects to an untouched suffix behind an idle link.  Only a successful
//! draft is written back, so a failed edit leaves the route exactly as it was.
use std::collections::VecDeque;
use std::cmp::{max, min};

use tracing::{instrument, trace};

use super::*;

#[derive(Debug, Clone)]
pub(super) struct Edit {
    anchor: EventId,
    skip: Vec<EventId>,
    inserts: Vec<(EventId, ReqId)>,
}

impl Edit {
    pub(super) fn new(anchor: EventId, skip: Vec<EventId>, inserts: Vec<(EventId, ReqId)>) -> Self {
        debug_assert!(!skip.contains(&anchor));
        debug_assert!(inserts.iter().all(|(after, _)| !skip.contains(after)));
        Edit { anchor, skip, inserts }
    }
}

enum Step {
    Existing(EventId),
    Fresh(ReqId),
}

/// Lazily merges the existing events after the anchor with the edit.
struct Steps<'a> {
    route: &'a Route,
    edit: &'a Edit,
    cursor: Option<EventId>,
    queue: VecDeque<ReqId>,
    inserts_left: usize,
    skips_left: usize,
}

impl<'a> Steps<'a> {
    fn new(route: &'a Route, edit: &'a Edit) -> Self {
        let mut steps = Steps {
            route,
            edit,
            cursor: route.event(edit.anchor).next,
            queue: VecDeque::new(),
            inserts_left: edit.inserts.len(),
            skips_left: edit.skip.len(),
        };
        steps.enqueue_after(edit.anchor);
        steps
    }

    fn enqueue_after(&mut self, id: EventId) {
        for &(after, r) in &self.edit.inserts {
            if after == id {
                self.queue.push_back(r);
            }
        }
    }

    /// Everything the edit changes has been emitted.
    #[inline]
    fn consumed(&self) -> bool {
        self.inserts_left == 0 && self.skips_left == 0
    }
}

impl Iterator for Steps<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if let Some(r) = self.queue.pop_front() {
            self.inserts_left -= 1;
            return Some(Step::Fresh(r));
        }
        while let Some(id) = self.cursor {
            self.cursor = self.route.event(id).next;
            if self.edit.skip.contains(&id) {
                self.skips_left -= 1;
                continue;
            }
            self.enqueue_after(id);
            return Some(Step::Existing(id));
        }
        None
    }
}

struct DraftNode {
    origin: Option<EventId>,
    event: Event,
    /// Leg to the following draft node (or to the resume point).
    leg: Time,
}

struct Draft {
    nodes: Vec<DraftNode>,
    /// Events from the start of the anchor's block up to (excluding) the anchor, with
    /// their forward windows.
    prefix: Vec<(EventId, Window)>,
    /// Untouched event the draft links back into, `None` if the draft runs to the stop
    /// depot.
    resume: Option<EventId>,
}

/// Latest-start tightening of `fwd` given the feasible window of a rigidly linked successor.
#[inline]
fn pull_back(fwd: Window, next: Window, d: Time) -> Window {
    Window::new(max(fwd.et, next.et - d), min(fwd.lt, next.lt - d))
}

impl Route {
    /// Forward windows from the first event of `anchor`'s rigid block up to `anchor`.
    /// Returns the windows of the events before the anchor and the anchor's own.
    fn block_prefix(&self, inst: &Instance, anchor: EventId) -> (Vec<(EventId, Window)>, Window) {
        let mut chain = vec![anchor];
        let mut cur = anchor;
        while let Some(p) = self.event(cur).prev {
            if self.event(p).slack {
                break;
            }
            chain.push(p);
            cur = p;
        }
        chain.reverse();

        let mut fwd = base_window(inst, self.event(chain[0]));
        let mut prefix = Vec::with_capacity(chain.len() - 1);
        for pair in chain.windows(2) {
            let (a, b) = (self.event(pair[0]), self.event(pair[1]));
            prefix.push((pair[0], fwd));
            fwd = fwd.shift(leg(inst, a, b)).intersect(&base_window(inst, b));
            debug_assert!(!fwd.is_empty());
        }
        (prefix, fwd)
    }

    fn slack_before(&self, id: EventId) -> bool {
        self.event(id).prev.map_or(false, |p| self.event(p).slack)
    }

    /// Propagate forward windows through the edited sequence.  `None` on a capacity or
    /// time window violation.
    fn propagate(&self, inst: &Instance, edit: &Edit) -> Option<Draft> {
        let (prefix, anchor_fwd) = self.block_prefix(inst, edit.anchor);
        let mut anchor = self.event(edit.anchor).clone();
        anchor.tentative = anchor_fwd;
        let mut nodes = vec![DraftNode { origin: Some(edit.anchor), event: anchor, leg: 0 }];
        let mut steps = Steps::new(self, edit);
        let mut resume = None;

        while let Some(step) = steps.next() {
            let (origin, mut ev) = match step {
                Step::Existing(id) => (Some(id), self.event(id).clone()),
                Step::Fresh(r) => (None, Event::for_request(inst.request(r))),
            };
            let prev = &nodes[nodes.len() - 1].event;
            let d = leg(inst, prev, &ev);
            let load = prev.load + load_delta(inst, &ev);
            if load < 0 || load > inst.capacity() {
                trace!(load, "load out of bounds");
                return None;
            }
            let base = base_window(inst, &ev);
            let shifted = prev.tentative.shift(d);
            let (fwd, slack) = if shifted.lt < base.et {
                if prev.load > 0 {
                    trace!(request=?ev.request, "vehicle would idle with passengers on board");
                    return None;
                }
                (base, true)
            } else if shifted.et > base.lt {
                trace!(request=?ev.request, "time window missed");
                return None;
            } else {
                (shifted.intersect(&base), false)
            };

            let last = nodes.len() - 1;
            nodes[last].event.slack = slack;
            nodes[last].leg = d;

            if let Some(id) = origin {
                // the rest of the route is unaffected from here on
                if slack && steps.consumed() && self.slack_before(id) && ev.load == load {
                    resume = Some(id);
                    break;
                }
            }
            ev.tentative = fwd;
            ev.load = load;
            nodes.push(DraftNode { origin, event: ev, leg: 0 });
        }

        assert!(steps.consumed(), "edit anchors are out of route order");
        debug_assert!(resume.is_some() || nodes[nodes.len() - 1].origin == Some(self.tail));

        // backward pass over the draft
        let n = nodes.len();
        let last = &mut nodes[n - 1].event;
        last.feasible = last.tentative;
        last.at = last.feasible.et;
        for i in (0..n - 1).rev() {
            let (head, tail) = nodes.split_at_mut(i + 1);
            let node = &mut head[i];
            let next = &tail[0].event;
            node.event.feasible = if node.event.slack {
                node.event.tentative
            } else {
                pull_back(node.event.tentative, next.feasible, node.leg)
            };
            debug_assert!(!node.event.feasible.is_empty());
            node.event.at = node.event.feasible.et;
        }

        Some(Draft { nodes, prefix, resume })
    }

    /// Write a successful draft into the arena and tighten the windows of the anchor's
    /// block behind it.
    fn update_route_range(&mut self, inst: &Instance, draft: Draft, edit: &Edit) {
        for &id in &edit.skip {
            self.release(id);
        }
        let ids: Vec<EventId> = draft.nodes.iter()
          .map(|node| match node.origin {
              Some(id) => id,
              None => self.alloc(),
          })
          .collect();

        let n = ids.len();
        let inserted = draft.nodes.iter().filter(|node| node.origin.is_none()).count();
        for (k, node) in draft.nodes.into_iter().enumerate() {
            let mut ev = node.event;
            if k > 0 {
                ev.prev = Some(ids[k - 1]);
            }
            ev.next = if k + 1 < n { Some(ids[k + 1]) } else { draft.resume };
            self.events[ids[k].index()] = ev;
        }
        if let Some(r) = draft.resume {
            self.events[r.index()].prev = Some(ids[n - 1]);
        }
        self.len = self.len + inserted - edit.skip.len();

        // events before the anchor share its block; their windows follow the edit, narrowing
        // after an insertion and widening after a deletion, until one comes out unchanged
        for &(id, fwd) in draft.prefix.iter().rev() {
            let ev = self.event(id);
            let next = self.event(ev.next.expect("block prefix never reaches the stop depot"));
            let feasible = pull_back(fwd, next.feasible, leg(inst, ev, next));
            if feasible == ev.feasible {
                break;
            }
            debug_assert!(!feasible.is_empty());
            let ev = &mut self.events[id.index()];
            ev.feasible = feasible;
            ev.at = feasible.et;
        }
        self.evaluated = false;
    }

    /// Propagate and, if feasible, commit `edit`.
    pub(super) fn apply(&mut self, inst: &Instance, edit: &Edit) -> bool {
        match self.propagate(inst, edit) {
            Some(draft) => {
                self.update_route_range(inst, draft, edit);
                true
            }
            None => false,
        }
    }

    /// Insert `client` with its pickup after `pickup_after` and its delivery after
    /// `delivery_after`.  Passing the same event twice places the delivery right after the
    /// pickup.  `delivery_after` must not precede `pickup_after`.
    #[instrument(level="trace", skip(self, inst))]
    pub fn try_insertion(&mut self, inst: &Instance, client: ClientId, pickup_after: EventId, delivery_after: EventId) -> bool {
        debug_assert!(pickup_after != self.tail && delivery_after != self.tail);
        let c = inst.client(client);
        let edit = Edit::new(pickup_after, Vec::new(), vec![(pickup_after, c.pickup), (delivery_after, c.delivery)]);
        self.apply(inst, &edit)
    }

    /// Remove the pickup and delivery events of one client.
    #[instrument(level="trace", skip(self, inst))]
    pub fn try_deletion(&mut self, inst: &Instance, pickup: EventId, delivery: EventId) -> bool {
        debug_assert_eq!(self.event(pickup).kind, EventKind::Pickup);
        debug_assert_eq!(self.event(delivery).kind, EventKind::Delivery);
        let anchor = match self.event(pickup).prev {
            Some(p) => p,
            None => unreachable!("a pickup always follows the start depot"),
        };
        let edit = Edit::new(anchor, vec![pickup, delivery], Vec::new());
        self.apply(inst, &edit)
    }

    /// Exchange the request at `first` with the one right after it.
    #[instrument(level="trace", skip(self, inst))]
    pub fn try_swap(&mut self, inst: &Instance, first: EventId) -> bool {
        let ev = self.event(first);
        let (anchor, second, req, other) = match (ev.prev, ev.next, ev.request) {
            (Some(a), Some(s), Some(r)) => match self.event(s).request {
                Some(o) => (a, s, r, o),
                None => panic!("event {} has no swappable successor", first),
            },
            _ => panic!("event {} has no swappable successor", first),
        };
        if inst.request(req).client == inst.request(other).client {
            return false;
        }
        let edit = Edit::new(anchor, vec![first], vec![(second, req)]);
        self.apply(inst, &edit)
    }
}
