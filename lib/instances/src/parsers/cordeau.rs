use std::path::Path;
use crate::Result;
use crate::raw::*;
use super::{
  ParseInstance,
  nom_prelude::*
};

/// Cordeau-format instance stored in a file.
#[derive(Debug, Copy, Clone)]
pub struct CordeauFmt<P>(pub P);

/// Cordeau-format instance already held in memory.
#[derive(Debug, Copy, Clone)]
pub struct CordeauStr<'a>(pub &'a str);

impl<P: AsRef<Path>> ParseInstance<CordeauFmt<P>> for DarpRaw {
  fn parse(path: CordeauFmt<P>) -> Result<DarpRaw> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    DarpRaw::parse(CordeauStr(&data))
  }
}

impl<'a> ParseInstance<CordeauStr<'a>> for DarpRaw {
  fn parse(text: CordeauStr<'a>) -> Result<DarpRaw> {
    let raw = match parsers::cordeau(text.0).finish() {
      Ok((_, instance)) => instance,
      Err(e) => return Err(
        anyhow::Error::msg(error::convert_error(text.0, e))
      ),
    };
    raw.validate()?;
    Ok(raw)
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  type Node = (usize, f64, f64, Time, Demand, Time, Time);

  fn node<'a, E>(input: &'a str) -> IResult<&'a str, Node, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    //   7   4.832  -8.990   3   1    0 1440
    terminated(
      preceded(space0, tuple((
        usize_,         // ID
        spaced(double), // x
        spaced(double), // y
        spaced(double), // srv time
        spaced(isize_), // demand
        spaced(double), // tw start
        spaced(double), // tw end
      ))),
      line_end,
    )(input)
  }

  pub fn cordeau(input: &str) -> IResult<&str, DarpRaw, error::VerboseError<&str>> {
    // K n T Q L
    let (input, (num_vehicles, num_requests, max_route_time, vehicle_capacity, max_ride_time)) =
      terminated(
        preceded(space0, tuple((usize_, spaced(usize_), spaced(double), spaced(usize_), spaced(double)))),
        line_end,
      )(input)?;

    let (input, nodes) = error::context("node line", many1(node))(input)?;
    let (input, _) = preceded(multispace0, eof)(input)?;

    let nlocs = nodes.len();
    let mut coords = Vec::with_capacity(nlocs);
    let mut demand = Vec::with_capacity(nlocs);
    let mut service_time = Vec::with_capacity(nlocs);
    let mut tw_start = Vec::with_capacity(nlocs);
    let mut tw_end = Vec::with_capacity(nlocs);

    for (_, x, y, s, q, e, l) in nodes {
      coords.push((x, y));
      service_time.push(s);
      demand.push(q);
      tw_start.push(e);
      tw_end.push(l);
    }

    Ok((input, DarpRaw {
      num_vehicles,
      num_requests,
      max_route_time,
      vehicle_capacity,
      max_ride_time,
      coords,
      service_time,
      demand,
      tw_start,
      tw_end,
    }))
  }
}
