pub use anyhow::Result;

use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    NodeCount { expected: usize, found: usize },
    UnbalancedDemand { pickup: usize, delivery: usize },
    EmptyTimeWindow { node: usize },
    DepotNotFirst,
}


impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}


pub mod raw;
pub mod parsers;

pub use parsers::{ParseInstance, CordeauFmt, CordeauStr};
pub use raw::{DarpRaw, FromRaw};
