//! Storage of sensor records.
//!
//! [`SensorRepository`] is the seam between the service and the backing store.
//! [`InMemorySensorRepository`] is the only implementation: a map guarded by a
//! single lock, which lives as long as the process does. Restarting the process
//! empties it, after which [`InMemorySensorRepository::with_example_sensors`]
//! re-seeds it.

use crate::model::{Sensor, SensorType};
use anyhow::anyhow;
use serde_json::Number;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait SensorRepository: Send + Sync {
    /// Returns all records in insertion order.
    fn find_all(&self) -> anyhow::Result<Vec<Sensor>>;

    fn find_by_id(&self, sensor_id: &str) -> anyhow::Result<Option<Sensor>>;

    /// Stores the record under its id, replacing any existing record with that id.
    fn create(&self, sensor: Sensor) -> anyhow::Result<Sensor>;

    /// Stores the record unless its id is taken.
    ///
    /// Checking and inserting happen atomically. Returns `None` if another
    /// record already uses the id, in which case nothing is changed.
    fn insert_if_absent(&self, sensor: Sensor) -> anyhow::Result<Option<Sensor>>;

    fn exists(&self, sensor_id: &str) -> anyhow::Result<bool>;
}

struct Entry {
    sequence: u64,
    sensor: Sensor,
}

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, Entry>,
    next_sequence: u64,
}

impl Entries {
    fn insert(&mut self, sensor: Sensor) {
        if let Some(entry) = self.by_id.get_mut(&sensor.sensor_id) {
            entry.sensor = sensor;
        } else {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.by_id
                .insert(sensor.sensor_id.clone(), Entry { sequence, sensor });
        }
    }
}

/// A process-local store of sensor records.
///
/// Records keep the position of their first insertion. Replacing a record via
/// [`SensorRepository::create`] does not move it to the end.
#[derive(Default)]
pub struct InMemorySensorRepository {
    entries: RwLock<Entries>,
}

impl InMemorySensorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with [`example_sensors`].
    pub fn with_example_sensors() -> Self {
        let mut entries = Entries::default();
        for sensor in example_sensors() {
            entries.insert(sensor);
        }

        InMemorySensorRepository {
            entries: RwLock::new(entries),
        }
    }

    fn read(&self) -> anyhow::Result<RwLockReadGuard<'_, Entries>> {
        self.entries
            .read()
            .map_err(|_| anyhow!("Sensor store is unavailable (poisoned lock)"))
    }

    fn write(&self) -> anyhow::Result<RwLockWriteGuard<'_, Entries>> {
        self.entries
            .write()
            .map_err(|_| anyhow!("Sensor store is unavailable (poisoned lock)"))
    }
}

impl SensorRepository for InMemorySensorRepository {
    fn find_all(&self) -> anyhow::Result<Vec<Sensor>> {
        let entries = self.read()?;
        let mut all = entries.by_id.values().collect::<Vec<_>>();
        all.sort_by_key(|entry| entry.sequence);

        Ok(all.into_iter().map(|entry| entry.sensor.clone()).collect())
    }

    fn find_by_id(&self, sensor_id: &str) -> anyhow::Result<Option<Sensor>> {
        Ok(self
            .read()?
            .by_id
            .get(sensor_id)
            .map(|entry| entry.sensor.clone()))
    }

    fn create(&self, sensor: Sensor) -> anyhow::Result<Sensor> {
        self.write()?.insert(sensor.clone());
        Ok(sensor)
    }

    fn insert_if_absent(&self, sensor: Sensor) -> anyhow::Result<Option<Sensor>> {
        let mut entries = self.write()?;
        if entries.by_id.contains_key(&sensor.sensor_id) {
            return Ok(None);
        }

        entries.insert(sensor.clone());
        Ok(Some(sensor))
    }

    fn exists(&self, sensor_id: &str) -> anyhow::Result<bool> {
        Ok(self.read()?.by_id.contains_key(sensor_id))
    }
}

const EXAMPLE_TIMESTAMP: &str = "2026-01-18T14:30:00Z";

/// The records a freshly started service is seeded with.
pub fn example_sensors() -> Vec<Sensor> {
    let example = |sensor_id: &str, sensor_type, value: Number, unit: &str| Sensor {
        sensor_id: sensor_id.to_string(),
        sensor_type,
        value,
        unit: unit.to_string(),
        timestamp: EXAMPLE_TIMESTAMP.to_string(),
    };

    vec![
        example(
            "temp_living_room",
            SensorType::Temperature,
            decimal(72.4),
            "F",
        ),
        example("humidity_basement", SensorType::Humidity, 45.into(), "%"),
        example("motion_kitchen", SensorType::Motion, 0.into(), "boolean"),
        example("temp_bedroom", SensorType::Temperature, decimal(68.2), "F"),
        example("humidity_living_room", SensorType::Humidity, 42.into(), "%"),
    ]
}

fn decimal(value: f64) -> Number {
    Number::from_f64(value).unwrap_or_else(|| 0.into())
}

/// A store which fails every operation, for exercising error paths.
#[cfg(test)]
pub struct UnavailableSensorRepository;

#[cfg(test)]
impl SensorRepository for UnavailableSensorRepository {
    fn find_all(&self) -> anyhow::Result<Vec<Sensor>> {
        Err(anyhow!("store unavailable"))
    }

    fn find_by_id(&self, _sensor_id: &str) -> anyhow::Result<Option<Sensor>> {
        Err(anyhow!("store unavailable"))
    }

    fn create(&self, _sensor: Sensor) -> anyhow::Result<Sensor> {
        Err(anyhow!("store unavailable"))
    }

    fn insert_if_absent(&self, _sensor: Sensor) -> anyhow::Result<Option<Sensor>> {
        Err(anyhow!("store unavailable"))
    }

    fn exists(&self, _sensor_id: &str) -> anyhow::Result<bool> {
        Err(anyhow!("store unavailable"))
    }
}
