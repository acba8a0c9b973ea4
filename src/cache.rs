// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Panel state cache and push update merging.
//!
//! Collections are filled once from the bootstrap snapshot. After that the
//! merge engine only replaces entity contents at positions that already
//! exist: nothing is inserted, removed or reordered, so a position handed
//! out in a [`StatusChange`] stays valid for the life of the client.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{
    CATEGORY_LIGHT, CATEGORY_ROLL, PAYLOAD_TYPE_CHANGES, SCENARIO_ARM_CATEGORIES,
    STATUS_BUS_HA_SENSORS, STATUS_OUTPUTS, STATUS_SYSTEM, STATUS_TEMPERATURES,
};
use crate::correlator::Snapshot;
use crate::event::{ChangeEvent, StatusChange};
use crate::protocol::{
    BusPeripheral, Entity, InboundFrame, OutputConfig, OutputStatus, ProgramOutput, Scenario,
    SensorStatus, SystemStatus, TemperatureStatus, ThermostatConfig,
};

/// An ordered entity sequence with a fixed protocol ID to position table.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    positions: HashMap<String, Vec<usize>>,
}

impl<T: Entity> Collection<T> {
    /// Positions are taken from the order of `items`. An ID the panel
    /// reports more than once maps to every position it appears at.
    pub fn new(items: Vec<T>) -> Self {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            positions
                .entry(item.entity_id().to_string())
                .or_default()
                .push(position);
        }
        Self { items, positions }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    /// First position of `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions_of(id).first().copied()
    }

    /// Every position of `id`, in order. Empty for unknown IDs.
    pub fn positions_of(&self, id: &str) -> &[usize] {
        self.positions.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_id(&self, id: &str) -> Option<&T> {
        self.position_of(id).and_then(|position| self.items.get(position))
    }

    /// Replace every entity with the same protocol ID. Returns the
    /// positions written, empty when the ID was not known at bootstrap.
    pub fn replace(&mut self, update: T) -> Vec<usize>
    where
        T: Clone,
    {
        let positions = self.positions_of(update.entity_id()).to_vec();
        for &position in &positions {
            if let Some(slot) = self.items.get_mut(position) {
                *slot = update.clone();
            }
        }
        positions
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

/// An entity together with its position handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexed<T> {
    pub position: usize,
    pub details: T,
}

/// A room sensor with climate readings and, when the panel has them, its
/// thermostat configuration and temperature status.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatView {
    pub sensor: Indexed<SensorStatus>,
    pub configuration: Option<Indexed<ThermostatConfig>>,
    pub temperature: Option<Indexed<TemperatureStatus>>,
}

/// Everything the client knows about the panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    output_configs: Collection<OutputConfig>,
    peripherals: Collection<BusPeripheral>,
    outputs: Collection<OutputStatus>,
    systems: Collection<SystemStatus>,
    sensors: Collection<SensorStatus>,
    temperatures: Collection<TemperatureStatus>,
    thermostats: Collection<ThermostatConfig>,
    scenarios: Collection<Scenario>,
    program_outputs: Collection<ProgramOutput>,
}

impl PanelState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            accessories,
            status,
            configuration,
        } = snapshot;
        Self {
            output_configs: Collection::new(accessories.outputs),
            peripherals: Collection::new(accessories.peripherals),
            outputs: Collection::new(status.outputs),
            systems: Collection::new(status.systems),
            sensors: Collection::new(status.sensors),
            temperatures: Collection::new(status.temperatures),
            thermostats: Collection::new(configuration.thermostats),
            scenarios: Collection::new(configuration.scenarios),
            program_outputs: Collection::new(configuration.program_outputs),
        }
    }

    pub fn output_configs(&self) -> &Collection<OutputConfig> {
        &self.output_configs
    }

    pub fn peripherals(&self) -> &Collection<BusPeripheral> {
        &self.peripherals
    }

    pub fn outputs(&self) -> &Collection<OutputStatus> {
        &self.outputs
    }

    pub fn systems(&self) -> &Collection<SystemStatus> {
        &self.systems
    }

    pub fn sensors(&self) -> &Collection<SensorStatus> {
        &self.sensors
    }

    pub fn temperatures(&self) -> &Collection<TemperatureStatus> {
        &self.temperatures
    }

    pub fn thermostats(&self) -> &Collection<ThermostatConfig> {
        &self.thermostats
    }

    pub fn scenarios(&self) -> &Collection<Scenario> {
        &self.scenarios
    }

    pub fn program_outputs(&self) -> &Collection<ProgramOutput> {
        &self.program_outputs
    }

    /// Apply a push update addressed to `receiver`.
    ///
    /// Frames that are not `CHANGES`, or carry nothing for `receiver`, are
    /// ignored. Returns the changes in the order they were applied.
    pub fn apply_frame(&mut self, frame: &InboundFrame, receiver: &str) -> Vec<ChangeEvent> {
        let mut changes = Vec::new();
        if frame.payload_type != PAYLOAD_TYPE_CHANGES {
            return changes;
        }
        let Some(categories) = frame.payload.get(receiver).and_then(Value::as_object) else {
            return changes;
        };

        for (category, items) in categories {
            match category.as_str() {
                STATUS_OUTPUTS => merge(&mut self.outputs, items, ChangeEvent::Output, &mut changes),
                STATUS_SYSTEM => merge(&mut self.systems, items, ChangeEvent::System, &mut changes),
                STATUS_BUS_HA_SENSORS => {
                    merge(&mut self.sensors, items, ChangeEvent::Sensor, &mut changes)
                }
                STATUS_TEMPERATURES => merge(
                    &mut self.temperatures,
                    items,
                    ChangeEvent::Temperature,
                    &mut changes,
                ),
                other => debug!("Ignoring update category {}", other),
            }
        }
        changes
    }

    // --- Views ---

    /// Lights without dimming.
    pub fn lights(&self) -> Vec<Indexed<OutputConfig>> {
        self.outputs_where(|config, status| {
            config.category == CATEGORY_LIGHT && !status.is_some_and(has_position)
        })
    }

    /// Lights reporting a dimming level.
    pub fn dimmers(&self) -> Vec<Indexed<OutputConfig>> {
        self.outputs_where(|config, status| {
            config.category == CATEGORY_LIGHT && status.is_some_and(has_position)
        })
    }

    pub fn shutters(&self) -> Vec<Indexed<OutputConfig>> {
        self.outputs_where(|config, _| config.category == CATEGORY_ROLL)
    }

    /// Scenarios except the arming ones.
    pub fn user_scenarios(&self) -> Vec<Indexed<Scenario>> {
        self.scenarios
            .items()
            .iter()
            .enumerate()
            .filter(|(_, scenario)| !SCENARIO_ARM_CATEGORIES.contains(&scenario.category.as_str()))
            .map(|(position, scenario)| Indexed {
                position,
                details: scenario.clone(),
            })
            .collect()
    }

    pub fn thermostat_views(&self) -> Vec<ThermostatView> {
        self.sensors
            .items()
            .iter()
            .enumerate()
            .filter(|(_, sensor)| sensor.domus.is_some())
            .map(|(position, sensor)| ThermostatView {
                sensor: Indexed {
                    position,
                    details: sensor.clone(),
                },
                configuration: indexed_by_id(&self.thermostats, &sensor.id),
                temperature: indexed_by_id(&self.temperatures, &sensor.id),
            })
            .collect()
    }

    fn outputs_where<F>(&self, keep: F) -> Vec<Indexed<OutputConfig>>
    where
        F: Fn(&OutputConfig, Option<&OutputStatus>) -> bool,
    {
        self.output_configs
            .items()
            .iter()
            .enumerate()
            .filter(|(_, config)| keep(config, self.outputs.by_id(&config.id)))
            .map(|(position, config)| Indexed {
                position,
                details: config.clone(),
            })
            .collect()
    }
}

fn indexed_by_id<T: Entity + Clone>(collection: &Collection<T>, id: &str) -> Option<Indexed<T>> {
    let position = collection.position_of(id)?;
    collection.get(position).map(|details| Indexed {
        position,
        details: details.clone(),
    })
}

fn has_position(status: &OutputStatus) -> bool {
    status.position.as_deref().is_some_and(|pos| !pos.is_empty())
}

/// Merge one category's update list into its collection.
///
/// Items for IDs unknown at bootstrap are dropped without a trace.
fn merge<T, F>(collection: &mut Collection<T>, items: &Value, wrap: F, changes: &mut Vec<ChangeEvent>)
where
    T: Entity + DeserializeOwned + Clone,
    F: Fn(StatusChange<T>) -> ChangeEvent,
{
    let Some(items) = items.as_array() else {
        warn!("Update list is not an array: {}", items);
        return;
    };
    for item in items {
        let update = match T::deserialize(item) {
            Ok(update) => update,
            Err(e) => {
                warn!("Skipping malformed update {}: {}", item, e);
                continue;
            }
        };
        for position in collection.replace(update.clone()) {
            changes.push(wrap(StatusChange {
                position,
                status: update.clone(),
            }));
        }
    }
}
