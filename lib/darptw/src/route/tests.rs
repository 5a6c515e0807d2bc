use super::*;
use crate::test_util;
use crate::model::round_time;
use proptest::prelude::*;
use rand::seq::SliceRandom;

fn client(i: usize) -> ClientId {
    ClientId::from(i)
}

const EARLY: usize = 0;
const FLEXIBLE: usize = 1;
const LATE: usize = 2;

/// An early and a late client with a long idle gap between them, plus one with wide
/// windows.
fn two_shifts() -> Instance {
    let mut b = InstanceBuilder::new(InstanceParams {
        vehicles: 1,
        capacity: 2,
        horizon: 600.0,
        max_ride_time: 60.0,
    }, (0.0, 0.0));
    b.add_client((1.0, 0.0), (2.0, 0.0), 1, 0.0, Some(Window::minutes(0.0, 10.0)), None);
    b.add_client((1.0, 0.0), (2.0, 0.0), 1, 0.0, Some(Window::minutes(300.0, 310.0)), None);
    b.add_client((1.0, 1.0), (2.0, 1.0), 1, 0.0, None, None);
    b.build()
}

fn both_shifts(inst: &Instance) -> Route {
    let (a, b) = (inst.client(client(EARLY)), inst.client(client(LATE)));
    Route::from_requests(inst, &[a.pickup, a.delivery, b.pickup, b.delivery]).unwrap()
}

fn recomputed(inst: &Instance, route: &Route) -> Route {
    Route::from_requests(inst, &route.requests()).expect("committed order must stay feasible")
}

#[test]
fn empty_route() {
    let inst = test_util::single_client();
    let route = Route::new(&inst);
    assert!(route.is_void());
    assert_eq!(route.len(), 2);
    assert_eq!(route.num_clients(), 0);
    route.check_invariants(&inst);
}

#[test]
fn single_client_insertion() {
    let inst = test_util::single_client();
    let mut route = Route::new(&inst);
    assert!(check_client_insertion(&inst, &mut route, client(0), &mut test_util::rng(0)));
    route.check_invariants(&inst);
    let m = *route.evaluate(&inst);
    assert_eq!(m.travel, round_time(10.0));
    assert_eq!(m.slack, 0);
    assert_eq!(m.wait, 0);
    assert_eq!(route.clients(), &[client(0)]);
    assert_eq!(route.num_clients(), 1);
}

#[test]
fn deleting_only_client_voids_route() {
    let inst = test_util::single_client();
    let mut route = Route::new(&inst);
    assert!(check_client_insertion(&inst, &mut route, client(0), &mut test_util::rng(1)));
    assert!(check_client_deletion(&inst, &mut route, client(0)));
    assert!(route.is_void());
    route.check_invariants(&inst);
    assert!(route.is_same(&Route::new(&inst)));
}

#[test]
fn clone_is_same() {
    let inst = two_shifts();
    let route = both_shifts(&inst);
    let copy = route.clone();
    assert!(copy.is_same(&route));
    assert_eq!(format!("{:?}", copy), format!("{:?}", route));
}

#[test]
fn wrong_order_is_rejected() {
    let inst = test_util::single_client();
    let c = inst.client(client(0));
    assert!(Route::from_requests(&inst, &[c.delivery, c.pickup]).is_none());
}

#[test]
fn idle_gap_between_shifts() {
    let inst = two_shifts();
    let mut route = both_shifts(&inst);
    route.check_invariants(&inst);
    let seq = route.sequence();
    assert!(route.event(seq[2]).slack);
    assert!(route.is_absolute_slack(&inst, seq[2]));
    assert!(!route.is_absolute_slack(&inst, seq[1]));
    let m = *route.evaluate(&inst);
    // delivery of the first client at 2, then one minute to the second pickup at 300
    assert_eq!(m.slack, round_time(297.0));
    // one minute from the depot to the first pickup
    assert_eq!(m.wait, round_time(1.0));
}

#[test]
fn deletion_widens_windows_before_anchor() {
    let inst = two_shifts();
    let (f, e) = (inst.client(client(FLEXIBLE)), inst.client(client(EARLY)));
    let mut route = Route::from_requests(&inst, &[f.pickup, f.delivery, e.pickup, e.delivery]).unwrap();
    let first = route.sequence()[1];
    let tight = route.event(first).feasible;

    assert!(check_client_deletion(&inst, &mut route, client(EARLY)));
    route.check_invariants(&inst);
    let relaxed = route.event(first).feasible;
    assert_eq!(relaxed.et, tight.et);
    assert!(relaxed.lt > tight.lt);
    assert!(route.is_same(&recomputed(&inst, &route)));
}

#[test]
fn candidates_do_not_straddle_absolute_slack() {
    let inst = two_shifts();
    let route = both_shifts(&inst);
    let seq = route.sequence();
    let pos = |id: EventId| seq.iter().position(|&x| x == id).unwrap();
    let candidates = insertion_candidates(&inst, &route, client(FLEXIBLE));
    assert!(!candidates.is_empty());
    for (p, d) in candidates {
        let (gp, gd) = (pos(p), pos(d));
        assert!(gp <= gd);
        assert!(!(gp < 2 && gd > 2), "pair ({}, {}) spans the idle gap", gp, gd);
    }
}

#[test]
fn loaded_wait_is_rejected_and_route_kept() {
    let inst = two_shifts();
    let mut route = both_shifts(&inst);
    let before = route.clone();
    let seq = route.sequence();
    // picked up before the gap, delivered after it
    assert!(!route.try_insertion(&inst, client(FLEXIBLE), seq[2], seq[3]));
    assert!(route.is_same(&before));
    route.check_invariants(&inst);
}

#[test]
fn insertion_fills_the_gap() {
    let inst = two_shifts();
    let mut route = both_shifts(&inst);
    assert!(check_client_insertion(&inst, &mut route, client(FLEXIBLE), &mut test_util::rng(3)));
    route.check_invariants(&inst);
    assert!(route.is_same(&recomputed(&inst, &route)));
    assert_eq!(route.num_clients(), 3);
}

#[test]
fn freed_slots_are_reused() {
    let inst = two_shifts();
    let mut route = both_shifts(&inst);
    assert!(check_client_deletion(&inst, &mut route, client(EARLY)));
    route.check_invariants(&inst);
    assert!(check_client_insertion(&inst, &mut route, client(FLEXIBLE), &mut test_util::rng(4)));
    route.check_invariants(&inst);
    assert_eq!(route.events.len(), 6);
}

#[test]
fn swap_keeps_schedule_consistent() {
    let inst = test_util::grid(12, 4);
    let mut rng = test_util::rng(7);
    let clients: Vec<_> = inst.client_ids().take(4).collect();
    let mut route = match generate_route_by_insertion(&inst, &clients, 10_000, &mut rng) {
        Some(r) => r,
        None => return,
    };
    route.evaluate(&inst);
    let points = route.swappable_points().to_vec();
    for p in points {
        let before = route.clone();
        let (a, b) = (route.event(p).request, route.event(route.event(p).next.unwrap()).request);
        if route.try_swap(&inst, p) {
            route.check_invariants(&inst);
            assert!(route.is_same(&recomputed(&inst, &route)));
            let order = route.requests();
            let ia = order.iter().position(|&r| Some(r) == a).unwrap();
            let ib = order.iter().position(|&r| Some(r) == b).unwrap();
            assert_eq!(ib + 1, ia);
            route = before;
        } else {
            assert!(route.is_same(&before));
        }
    }
}

#[test]
fn generated_route_serves_exactly_the_given_clients() {
    let inst = test_util::grid(10, 3);
    let mut rng = test_util::rng(11);
    let clients = vec![client(0), client(3), client(5)];
    if let Some(mut route) = generate_route_by_insertion(&inst, &clients, 10_000, &mut rng) {
        route.check_invariants(&inst);
        route.evaluate(&inst);
        assert_eq!(route.clients(), &clients[..]);
    }
}

#[test]
fn generation_respects_budget() {
    let inst = test_util::grid(10, 3);
    let clients: Vec<_> = inst.client_ids().collect();
    assert!(generate_route_by_insertion(&inst, &clients, 0, &mut test_util::rng(0)).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn incremental_edits_match_full_recompute(seed in 0u64..10_000, n in 1usize..8) {
        let inst = test_util::grid(14, 4);
        let mut rng = test_util::rng(seed);
        let mut route = Route::new(&inst);
        let mut order: Vec<_> = inst.client_ids().collect();
        order.shuffle(&mut rng);
        for &c in order.iter().take(n) {
            let before = route.clone();
            if check_client_insertion(&inst, &mut route, c, &mut rng) {
                route.check_invariants(&inst);
                prop_assert!(route.is_same(&recomputed(&inst, &route)));
            } else {
                prop_assert!(route.is_same(&before));
            }
        }
        route.evaluate(&inst);
        let served = route.clients().to_vec();
        for c in served {
            let before = route.clone();
            if check_client_deletion(&inst, &mut route, c) {
                route.check_invariants(&inst);
                prop_assert!(route.is_same(&recomputed(&inst, &route)));
            } else {
                prop_assert!(route.is_same(&before));
            }
        }
    }

    #[test]
    fn insert_then_delete_restores_route(seed in 0u64..10_000) {
        let inst = test_util::grid(14, 4);
        let mut rng = test_util::rng(seed);
        let mut route = Route::new(&inst);
        let mut order: Vec<_> = inst.client_ids().collect();
        order.shuffle(&mut rng);
        let (last, rest) = order.split_last().unwrap();
        for &c in rest.iter().take(4) {
            check_client_insertion(&inst, &mut route, c, &mut rng);
        }
        let original = route.clone();
        if check_client_insertion(&inst, &mut route, *last, &mut rng) {
            prop_assert!(check_client_deletion(&inst, &mut route, *last));
            prop_assert!(route.is_same(&original));
        }
    }

    #[test]
    fn committed_schedule_is_feasible(seed in 0u64..10_000) {
        let inst = test_util::grid(14, 4);
        let mut rng = test_util::rng(seed);
        let mut route = Route::new(&inst);
        for c in inst.client_ids() {
            if check_client_insertion(&inst, &mut route, c, &mut rng) {
                for (_, ev) in route.iter() {
                    prop_assert!(ev.feasible.contains(ev.at));
                    prop_assert!(ev.load <= inst.capacity());
                }
            }
        }
    }
}
