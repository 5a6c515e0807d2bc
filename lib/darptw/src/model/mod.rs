use std::cmp::{max, min};

mod geography;
mod request;
mod instance;

pub use geography::Geography;
pub use request::{Client, Request, RequestKind, update_times_from_delivery, update_times_from_pickup};
pub use instance::{ClientSpec, Instance, InstanceBuilder, InstanceParams, StopSpec};

define_u32_index_type!(ClientId);
define_u32_index_type!(ReqId);
define_u32_index_type!(LocId);

/// Scaled minutes.  Integer arithmetic keeps window propagation exact.
pub type Time = i64;
pub type Demand = i32;

pub const TIME_PREC : u32 = 3;
pub const TIME_SCALE : f64 = 1_000.0; // 10**TIME_PREC

#[inline]
pub fn round_time(minutes: f64) -> Time {
    (minutes * TIME_SCALE).round() as Time
}

#[inline]
pub fn to_minutes(t: Time) -> f64 {
    t as f64 / TIME_SCALE
}

/// A closed interval `[et, lt]` of service start times.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Window {
    pub et: Time,
    pub lt: Time,
}

impl Window {
    #[inline]
    pub const fn new(et: Time, lt: Time) -> Self {
        Window { et, lt }
    }

    pub fn minutes(et: f64, lt: f64) -> Self {
        Window::new(round_time(et), round_time(lt))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.et > self.lt
    }

    #[inline]
    pub fn contains(&self, t: Time) -> bool {
        self.et <= t && t <= self.lt
    }

    #[inline]
    pub fn width(&self) -> Time {
        self.lt - self.et
    }

    /// The window displaced by `d` (service plus travel to the next stop).
    #[inline]
    pub fn shift(&self, d: Time) -> Self {
        Window::new(self.et + d, self.lt + d)
    }

    #[inline]
    pub fn intersect(&self, other: &Window) -> Self {
        Window::new(max(self.et, other.et), min(self.lt, other.lt))
    }

    /// Non-empty and inside `[0, horizon]`.
    pub fn is_valid(&self, horizon: Time) -> bool {
        0 <= self.et && self.et <= self.lt && self.lt <= horizon
    }
}
