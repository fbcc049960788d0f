//! Projection of a [`Snapshot`] into flat Prometheus metric lines.
//!
//! Sections are visited in a fixed order (GCL, creeps, rooms, CPU, time) so
//! that the same snapshot always renders to the same text. A section that is
//! absent contributes no lines; a field that is absent inside a present
//! section is still emitted, with a `NaN` value.

use std::fmt;

use indexmap::IndexMap;
use screeps_common::snapshot::{CpuStats, CreepRecord, GclStats, Reading, RoomStats, Snapshot};

use crate::mapping::{build_metric_name, escape_label_value, format_value};

/// A single exposition line: `name{labels} value`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    /// The full Prometheus metric name.
    pub name: String,
    /// Label key-value pairs, in emission order.
    pub labels: Vec<(String, String)>,
    /// The sample value. Missing readings are NaN.
    pub value: f64,
}

impl MetricLine {
    /// Create an unlabeled line.
    pub fn new(name: impl Into<String>, value: impl Into<Reading>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            value: value.into().value().unwrap_or(f64::NAN),
        }
    }

    /// Add a label, replacing any existing label with the same key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.labels.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.labels.push((key, value)),
        }
        self
    }

    /// Format labels for Prometheus exposition format.
    pub fn format_labels(&self) -> String {
        if self.labels.is_empty() {
            return String::new();
        }

        let parts: Vec<String> = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect();

        format!("{{{}}}", parts.join(","))
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}",
            self.name,
            self.format_labels(),
            format_value(self.value)
        )
    }
}

/// Turn a snapshot into metric lines. Never fails.
pub fn format(snapshot: &Snapshot) -> Vec<MetricLine> {
    let mut lines = Vec::new();

    if let Some(gcl) = &snapshot.gcl {
        push_gcl(&mut lines, gcl);
    }
    if let Some(creeps) = &snapshot.creeps {
        push_creeps(&mut lines, creeps);
    }
    if let Some(rooms) = &snapshot.rooms {
        for (name, room) in rooms {
            push_room(&mut lines, name, room);
        }
    }
    if let Some(cpu) = &snapshot.cpu {
        push_cpu(&mut lines, cpu);
    }
    if let Some(time) = snapshot.time {
        lines.push(MetricLine::new(build_metric_name("time", ""), time));
    }

    lines
}

/// Join lines into an exposition body, one line per sample.
pub fn render(lines: &[MetricLine]) -> String {
    let mut output = String::with_capacity(lines.len() * 48);
    for line in lines {
        output.push_str(&line.to_string());
        output.push('\n');
    }
    output
}

fn push_gcl(lines: &mut Vec<MetricLine>, gcl: &GclStats) {
    let level = format_value(gcl.level.value().unwrap_or(f64::NAN));

    lines.push(MetricLine::new(build_metric_name("gcl", "level"), gcl.level));
    lines.push(
        MetricLine::new(build_metric_name("gcl", "progress"), gcl.progress)
            .with_label("level", level.clone()),
    );
    lines.push(
        MetricLine::new(build_metric_name("gcl", "progressTotal"), gcl.progress_total)
            .with_label("level", level),
    );
}

fn push_creeps(lines: &mut Vec<MetricLine>, creeps: &IndexMap<String, CreepRecord>) {
    lines.push(MetricLine::new(
        build_metric_name("creeps", "total"),
        creeps.len() as f64,
    ));

    // Roles are counted in the order they are first seen.
    let mut roles: IndexMap<&str, usize> = IndexMap::new();
    for creep in creeps.values() {
        *roles.entry(creep.role_key()).or_insert(0) += 1;
    }

    let name = build_metric_name("creeps", "role");
    for (role, count) in roles {
        lines.push(MetricLine::new(name.clone(), count as f64).with_label("role", role));
    }
}

fn push_room(lines: &mut Vec<MetricLine>, room_name: &str, room: &RoomStats) {
    let fields = [
        ("storageEnergy", room.storage_energy),
        ("terminalEnergy", room.terminal_energy),
        ("energyAvailable", room.energy_available),
        ("energyCapacityAvailable", room.energy_capacity_available),
        ("controllerProgress", room.controller_progress),
        ("controllerProgressTotal", room.controller_progress_total),
        ("controllerLevel", room.controller_level),
    ];

    for (field, reading) in fields {
        lines.push(
            MetricLine::new(build_metric_name("room", field), reading).with_label("room", room_name),
        );
    }
}

fn push_cpu(lines: &mut Vec<MetricLine>, cpu: &CpuStats) {
    lines.push(MetricLine::new(build_metric_name("cpu", "bucket"), cpu.bucket));
    lines.push(MetricLine::new(build_metric_name("cpu", "limit"), cpu.limit));
    lines.push(MetricLine::new(build_metric_name("cpu", "used"), cpu.used));
}
