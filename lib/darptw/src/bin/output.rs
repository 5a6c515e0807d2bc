use std::fmt::{Debug, Display};
use std::io::Write;
use std::ops::RangeBounds;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use itertools::Itertools;
use structopt::StructOpt;

use darptw::fleet::RouteRecord;
use darptw::ga::RunSummary;
use darptw::genome::Genome;
use darptw::route::{EventKind, StopRecord};
use darptw::{Evaluation, Instance, IntUid};

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
    #[structopt(long="format", short="f", default_value="summary", possible_values=&FORMAT_STRINGS)]
    pub format: OutputFormat,
    /// Write the solution here instead of stdout
    #[structopt(long="output", short="o", parse(from_os_str))]
    pub file: Option<PathBuf>,
    /// JSON log file
    #[structopt(long, parse(from_os_str))]
    pub log: Option<PathBuf>,
}

pub const FORMAT_STRINGS: [&str; 3] = ["json", "summary", "routes"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    /// Objective, history and every route's schedule.
    Json,
    /// Objective and history only.
    Summary,
    /// One line per used vehicle listing its stops.
    Routes,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "summary" => Ok(OutputFormat::Summary),
            "routes" => Ok(OutputFormat::Routes),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

/// Structopt validator accepting values that parse as `T` and fall in `range`.
pub fn in_range<T, R>(range: R) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd,
        T::Err: Display,
        R: RangeBounds<T> + Debug,
{
    move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if range.contains(&x) {
            Ok(())
        } else {
            Err(format!("{} is outside {:?}", val, range))
        }
    }
}

fn kind_str(kind: EventKind) -> &'static str {
    match kind {
        EventKind::StartDepot => "start",
        EventKind::Pickup => "pickup",
        EventKind::Delivery => "delivery",
        EventKind::StopDepot => "stop",
    }
}

fn stop_json(s: &StopRecord) -> json::JsonValue {
    json::object! {
        kind: kind_str(s.kind),
        client: s.client.map(|c| c.index()),
        at: s.at,
        earliest: s.earliest,
        latest: s.latest,
        load: s.load,
    }
}

fn route_json(r: &RouteRecord) -> json::JsonValue {
    json::object! {
        vehicle: r.vehicle,
        clients: r.clients.iter().map(|c| c.index()).collect_vec(),
        stops: r.stops.iter().map(stop_json).collect_vec(),
    }
}

fn evaluation_json(e: &Evaluation) -> json::JsonValue {
    json::object! {
        fitness: e.fitness,
        vehicles: e.vehicles,
        travel: e.travel,
        slack: e.slack,
        wait: e.wait,
        ride: e.ride,
        excess_ride: e.excess_ride,
    }
}

/// `+3@12.00` picks up client 3 at minute 12, `-3` drops it off, `D` is the depot.
fn stop_token(s: &StopRecord) -> String {
    let tag = match (s.kind, s.client) {
        (EventKind::Pickup, Some(c)) => format!("+{}", c.index()),
        (EventKind::Delivery, Some(c)) => format!("-{}", c.index()),
        _ => "D".to_string(),
    };
    format!("{}@{:.2}", tag, s.at)
}

fn route_line(r: &RouteRecord) -> String {
    format!("vehicle {}: {}", r.vehicle, r.stops.iter().map(stop_token).join(" "))
}

/// The outcome of one run, ready to be written in any [`OutputFormat`].
pub struct Report<'a, G> {
    pub instance: &'a Instance,
    pub summary: RunSummary<G>,
}

impl<G: Genome> Report<'_, G> {
    fn used_routes(&self) -> Vec<RouteRecord> {
        self.summary.best.render(self.instance).into_iter()
          .filter(|r| !r.clients.is_empty())
          .collect()
    }

    fn summary_json(&self) -> json::JsonValue {
        json::object! {
            instance: self.instance.id.as_str(),
            clients: self.instance.num_clients(),
            evaluation: evaluation_json(self.summary.best.evaluation()),
            history: self.summary.history.clone(),
        }
    }

    pub fn write(&self, mut buf: impl Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Summary => self.summary_json().write_pretty(&mut buf, 2)?,
            OutputFormat::Json => {
                let mut root = self.summary_json();
                root["routes"] = self.used_routes().iter().map(route_json).collect_vec().into();
                root.write_pretty(&mut buf, 2)?;
            }
            OutputFormat::Routes => {
                let e = self.summary.best.evaluation();
                writeln!(buf, "{}: fitness {:.3}, {} vehicles", self.instance.id, e.fitness, e.vehicles)?;
                for r in self.used_routes() {
                    writeln!(buf, "{}", route_line(&r))?;
                }
            }
        }
        Ok(())
    }
}

pub fn emit<G: Genome>(options: &OutputOptions, report: &Report<G>) -> Result<()> {
    match options.file.as_ref() {
        Some(path) => {
            let file = std::fs::File::create(path)
              .with_context(|| format!("cannot create {}", path.display()))?;
            report.write(std::io::BufWriter::new(file), options.format)
        }
        None => report.write(std::io::stdout(), options.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darptw::genome::RouteArrayGenome;
    use darptw::{InstanceBuilder, InstanceParams, Search};
    use rand::{rngs::StdRng, SeedableRng};

    fn report(instance: &Instance) -> Report<'_, RouteArrayGenome> {
        let search = Search::new(instance);
        let best = RouteArrayGenome::random(&search, &mut StdRng::seed_from_u64(0)).unwrap();
        let history = vec![best.fitness()];
        Report { instance, summary: RunSummary { best, history } }
    }

    fn one_client() -> Instance {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles: 2,
            capacity: 1,
            horizon: 100.0,
            max_ride_time: 30.0,
        }, (0.0, 0.0)).with_id("tiny");
        b.add_client((0.0, 0.0), (3.0, 4.0), 1, 0.0, None, None);
        b.build()
    }

    #[test]
    fn routes_list_used_vehicles_only() {
        let inst = one_client();
        let mut buf = Vec::new();
        report(&inst).write(&mut buf, OutputFormat::Routes).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("tiny: fitness"));
        assert!(lines[1].ends_with("D@0.00 +0@0.00 -0@5.00 D@10.00"), "{}", lines[1]);
    }

    #[test]
    fn json_carries_routes_and_summary_does_not() {
        let inst = one_client();
        let r = report(&inst);
        let parse = |format| {
            let mut buf = Vec::new();
            r.write(&mut buf, format).unwrap();
            json::parse(&String::from_utf8(buf).unwrap()).unwrap()
        };
        let full = parse(OutputFormat::Json);
        assert_eq!(full["routes"].len(), 1);
        assert_eq!(full["routes"][0]["stops"].len(), 4);
        assert_eq!(full["evaluation"]["vehicles"], 1);
        assert!(parse(OutputFormat::Summary)["routes"].is_null());
    }

    #[test]
    fn range_validation() {
        let unit = in_range::<f64, _>(0.0..=1.0);
        assert!(unit("0.5".to_string()).is_ok());
        assert!(unit("1.5".to_string()).is_err());
        assert!(unit("x".to_string()).is_err());
        let positive = in_range::<usize, _>(1..);
        assert!(positive("0".to_string()).is_err());
        assert!(positive("7".to_string()).is_ok());
    }
}
