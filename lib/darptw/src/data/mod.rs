//! Building an [`Instance`] from Cordeau-format DARP files.
use std::borrow::Cow;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use instances::{CordeauFmt, CordeauStr, DarpRaw, FromRaw, ParseInstance};
use tracing::*;

use crate::model::*;

fn stop(raw: &DarpRaw, node: usize) -> StopSpec {
  let (et, lt) = (raw.tw_start[node], raw.tw_end[node]);
  // a window spanning the whole horizon is no constraint at all
  let window = if et > 0.0 || lt < raw.horizon() {
    Some(Window::minutes(et, lt))
  } else {
    None
  };
  StopSpec { at: raw.coords[node], service: raw.service_time[node], window }
}

impl FromRaw<DarpRaw> for Instance {
  fn from_raw(raw: DarpRaw, id: Cow<str>) -> Self {
    let params = InstanceParams {
      vehicles: raw.num_vehicles,
      capacity: raw.vehicle_capacity as Demand,
      horizon: raw.horizon(),
      max_ride_time: raw.max_ride_time,
    };
    let mut builder = InstanceBuilder::new(params, raw.coords[0]).with_id(id.into_owned());
    for r in 0..raw.num_requests {
      let (p, d) = (raw.pickup(r), raw.delivery(r));
      builder.add_client_spec(ClientSpec {
        pickup: stop(&raw, p),
        delivery: stop(&raw, d),
        load: raw.demand[p] as Demand,
      });
    }
    builder.build()
  }
}

fn check(raw: &DarpRaw) -> Result<()> {
  ensure!(raw.num_vehicles > 0, "instance has no vehicles");
  ensure!(raw.vehicle_capacity > 0, "vehicle capacity must be positive");
  ensure!(raw.horizon() > 0.0, "depot time window is empty");
  Ok(())
}

pub fn parse_instance(text: &str, id: &str) -> Result<Instance> {
  let raw = DarpRaw::parse(CordeauStr(text))?;
  check(&raw)?;
  Ok(Instance::from_raw(raw, Cow::Borrowed(id)))
}

/// Load a Cordeau-format file.  The instance is named after the file stem.
#[instrument(level="info", skip(path), fields(path=%path.as_ref().display()))]
pub fn load_instance(path: impl AsRef<Path>) -> Result<Instance> {
  let path = path.as_ref();
  let raw = DarpRaw::parse(CordeauFmt(path))
    .with_context(|| format!("failed to read instance {}", path.display()))?;
  check(&raw).with_context(|| format!("invalid instance {}", path.display()))?;
  let id = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or(Cow::Borrowed("unnamed"));
  let inst = Instance::from_raw(raw, id);
  info!(clients = inst.num_clients(), vehicles = inst.num_vehicles(), incompatible_pairs = inst.incompatibility().num_pairs(), "instance loaded");
  Ok(inst)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::IntUid;

  const TWO_REQUESTS: &str = "\
2 2 480 3 30
  0   0.000   0.000  0  0    0 1440
  1   1.000   0.000  3  1    0 1440
  2  -2.500   4.000  3  2  100  130
  3   4.000   4.000  3 -1   60   75
  4   0.000  -3.000  3 -2    0 1440
  5   0.000   0.000  0  0    0 1440
";

  #[test]
  fn windows_derived_on_load() -> Result<()> {
    let inst = parse_instance(TWO_REQUESTS, "two")?;
    assert_eq!(inst.id, "two");
    assert_eq!(inst.num_clients(), 2);
    assert_eq!(inst.num_vehicles(), 2);
    assert_eq!(inst.capacity(), 3);
    assert_eq!(inst.horizon, round_time(1440.0));

    // the first request states its delivery window, so the pickup side is derived
    let first = inst.client(ClientId::new(0));
    let pickup = inst.request(first.pickup);
    assert_eq!(pickup.window, Window::minutes(27.0, 67.0));
    assert!(pickup.is_derived());
    assert_eq!(inst.request(first.delivery).window, Window::minutes(60.0, 75.0));
    assert_eq!(pickup.load, 1);

    let second = inst.client(ClientId::new(1));
    assert_eq!(inst.request(second.pickup).window, Window::minutes(100.0, 130.0));
    assert!(inst.request(second.delivery).is_derived());
    assert_eq!(inst.request(second.pickup).load, 2);
    Ok(())
  }

  #[test]
  fn missing_file_has_context() {
    let err = load_instance("/nonexistent/a1-2.txt").unwrap_err();
    assert!(err.to_string().contains("a1-2.txt"));
  }

  #[test]
  fn no_vehicles() {
    let text = TWO_REQUESTS.replacen("2 2 480", "0 2 480", 1);
    assert!(parse_instance(&text, "none").is_err());
  }
}
