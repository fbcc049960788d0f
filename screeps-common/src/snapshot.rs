//! Typed view of the `Memory.stats` object published by a Screeps bot.
//!
//! The snapshot follows the flat layout: every section sits at the top level
//! of the stats object. Every section is optional, and every numeric field
//! inside a section is a [`Reading`], which tolerates absent or non-numeric
//! values instead of failing the whole document. A malformed room or creep
//! entry is read as an empty record; only a section of the wrong type is
//! rejected.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Role key used for creeps that carry no `role` field.
pub const UNDEFINED_ROLE: &str = "undefined";

/// A numeric field that may be missing.
///
/// Deserializes any JSON number into `Some`, and anything else (`null`,
/// strings, objects) into `None`. Serializes back to a number or `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading(Option<f64>);

impl Reading {
    /// A reading with no value.
    pub const MISSING: Reading = Reading(None);

    /// The numeric value, if one was present.
    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_none()
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        Reading(Some(v))
    }
}

impl From<i64> for Reading {
    fn from(v: i64) -> Self {
        Reading(Some(v as f64))
    }
}

impl From<Option<f64>> for Reading {
    fn from(v: Option<f64>) -> Self {
        Reading(v)
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Reading(value.as_f64()))
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_none(),
        }
    }
}

/// Global Control Level progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GclStats {
    #[serde(default)]
    pub level: Reading,
    #[serde(default)]
    pub progress: Reading,
    #[serde(default)]
    pub progress_total: Reading,
}

/// Per-room economy and controller figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    #[serde(default)]
    pub storage_energy: Reading,
    #[serde(default)]
    pub terminal_energy: Reading,
    #[serde(default)]
    pub energy_available: Reading,
    #[serde(default)]
    pub energy_capacity_available: Reading,
    #[serde(default)]
    pub controller_progress: Reading,
    #[serde(default)]
    pub controller_progress_total: Reading,
    #[serde(default)]
    pub controller_level: Reading,
}

/// A single creep entry. Only the role is of interest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreepRecord {
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
}

impl CreepRecord {
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
        }
    }

    /// The key this creep is grouped under when counting roles.
    pub fn role_key(&self) -> &str {
        self.role.as_deref().unwrap_or(UNDEFINED_ROLE)
    }
}

/// Read a role the way the bot's role counter keys it: the value is used as
/// a JavaScript object key, so non-string roles group by their string form
/// (`3` and `"3"` share a group, `null` becomes `"null"`).
fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Some(js_key(&value)))
}

/// `String(value)` for a JSON value.
fn js_key(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_key(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn js_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Read a keyed section entry by entry. An entry that does not fit `T`
/// becomes `T::default()` so the rest of the document still renders.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Option<IndexMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let entries: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(entries.map(|entries| {
        entries
            .into_iter()
            .map(|(key, value)| (key, T::deserialize(value).unwrap_or_default()))
            .collect()
    }))
}

/// CPU usage for the sampled tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub bucket: Reading,
    #[serde(default)]
    pub limit: Reading,
    #[serde(default)]
    pub used: Reading,
}

/// A decoded stats snapshot.
///
/// `rooms` and `creeps` keep the key order of the source document so that
/// the rendered metrics come out in a reproducible order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcl: Option<GclStats>,

    #[serde(
        default,
        deserialize_with = "lenient_entries",
        skip_serializing_if = "Option::is_none"
    )]
    pub rooms: Option<IndexMap<String, RoomStats>>,

    #[serde(
        default,
        deserialize_with = "lenient_entries",
        skip_serializing_if = "Option::is_none"
    )]
    pub creeps: Option<IndexMap<String, CreepRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Reading>,
}

impl Snapshot {
    /// True when no section is present.
    pub fn is_empty(&self) -> bool {
        self.gcl.is_none()
            && self.rooms.is_none()
            && self.creeps.is_none()
            && self.cpu.is_none()
            && self.time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_snapshot_deserialization() {
        let value = json!({
            "gcl": { "level": 10, "progress": 500, "progressTotal": 1000 },
            "rooms": {
                "W1N1": {
                    "storageEnergy": 100000,
                    "terminalEnergy": 5000,
                    "energyAvailable": 300,
                    "energyCapacityAvailable": 550,
                    "controllerProgress": 1200,
                    "controllerProgressTotal": 45000,
                    "controllerLevel": 4
                }
            },
            "creeps": {
                "Alice": { "role": "harvester" },
                "Bob": {}
            },
            "cpu": { "bucket": 9000, "limit": 20, "used": 5.2 },
            "time": 123456
        });

        let snapshot: Snapshot = serde_json::from_value(value).unwrap();

        let gcl = snapshot.gcl.unwrap();
        assert_eq!(gcl.level.value(), Some(10.0));
        assert_eq!(gcl.progress_total.value(), Some(1000.0));

        let rooms = snapshot.rooms.unwrap();
        assert_eq!(rooms["W1N1"].energy_capacity_available.value(), Some(550.0));
        assert_eq!(rooms["W1N1"].controller_level.value(), Some(4.0));

        let creeps = snapshot.creeps.unwrap();
        assert_eq!(creeps["Alice"].role_key(), "harvester");
        assert_eq!(creeps["Bob"].role_key(), UNDEFINED_ROLE);

        assert_eq!(snapshot.cpu.unwrap().used.value(), Some(5.2));
        assert_eq!(snapshot.time, Some(Reading::from(123456_i64)));
    }

    #[test]
    fn test_empty_document() {
        let snapshot: Snapshot = serde_json::from_value(json!({})).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_null_sections_are_absent() {
        let snapshot: Snapshot =
            serde_json::from_value(json!({ "gcl": null, "time": null })).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_non_numeric_fields_are_missing() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "cpu": { "bucket": "full", "limit": null },
            "time": "soon"
        }))
        .unwrap();

        let cpu = snapshot.cpu.unwrap();
        assert!(cpu.bucket.is_missing());
        assert!(cpu.limit.is_missing());
        assert!(cpu.used.is_missing());
        assert_eq!(snapshot.time, Some(Reading::MISSING));
    }

    #[test]
    fn test_room_order_is_preserved() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"rooms": {"W9N9": {}, "E1S1": {}, "W1N1": {}}}"#,
        )
        .unwrap();

        let names: Vec<&str> = snapshot
            .rooms
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["W9N9", "E1S1", "W1N1"]);
    }

    #[test]
    fn test_non_string_roles_use_their_key_text() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "creeps": {
                "a": { "role": 3 },
                "b": { "role": null },
                "c": { "role": "3" },
                "d": { "role": true },
                "e": { "role": ["miner", null, 2] },
                "f": { "role": { "kind": "miner" } },
                "g": { "role": 2.0 },
                "h": {}
            }
        }))
        .unwrap();

        let creeps = snapshot.creeps.unwrap();
        assert_eq!(creeps["a"].role_key(), "3");
        assert_eq!(creeps["b"].role_key(), "null");
        assert_eq!(creeps["c"].role_key(), "3");
        assert_eq!(creeps["d"].role_key(), "true");
        assert_eq!(creeps["e"].role_key(), "miner,,2");
        assert_eq!(creeps["f"].role_key(), "[object Object]");
        assert_eq!(creeps["g"].role_key(), "2");
        assert_eq!(creeps["h"].role_key(), UNDEFINED_ROLE);
    }

    #[test]
    fn test_malformed_entries_become_empty_records() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "creeps": { "a": "x", "b": { "role": "hauler" } },
            "rooms": { "W1N1": null, "W2N2": { "controllerLevel": 3 } },
            "time": 1
        }))
        .unwrap();

        let creeps = snapshot.creeps.unwrap();
        assert_eq!(creeps["a"].role_key(), UNDEFINED_ROLE);
        assert_eq!(creeps["b"].role_key(), "hauler");

        let rooms = snapshot.rooms.unwrap();
        assert_eq!(rooms["W1N1"], RoomStats::default());
        assert_eq!(rooms["W2N2"].controller_level.value(), Some(3.0));

        assert_eq!(snapshot.time, Some(Reading::from(1_i64)));
    }

    #[test]
    fn test_keyed_section_of_wrong_type_is_rejected() {
        let result: Result<Snapshot, _> = serde_json::from_value(json!({ "rooms": [1, 2, 3] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_section_of_wrong_type_is_rejected() {
        let result: Result<Snapshot, _> = serde_json::from_value(json!({ "gcl": 7 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_absent_sections() {
        let snapshot = Snapshot {
            time: Some(Reading::from(42_i64)),
            ..Default::default()
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value, json!({ "time": 42.0 }));
    }
}
