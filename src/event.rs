// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

use crate::protocol::{OutputStatus, SensorStatus, SystemStatus, TemperatureStatus};

/// A cached entity was replaced by a push update.
///
/// `position` is the entity's fixed index in its collection, assigned at
/// bootstrap. It is the handle consumers use to refer to the entity.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange<T> {
    pub position: usize,
    pub status: T,
}

/// One change produced by the merge engine, by category.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Output(StatusChange<OutputStatus>),
    /// Cache only, there is no public system channel.
    System(StatusChange<SystemStatus>),
    Sensor(StatusChange<SensorStatus>),
    Temperature(StatusChange<TemperatureStatus>),
}

/// Type alias for a broadcast sender of changes.
pub type ChangeSender<T> = tokio::sync::broadcast::Sender<StatusChange<T>>;

/// Type alias for a broadcast receiver of changes.
pub type ChangeReceiver<T> = tokio::sync::broadcast::Receiver<StatusChange<T>>;

/// Create a new change channel with the given capacity.
pub fn change_channel<T: Clone>(capacity: usize) -> (ChangeSender<T>, ChangeReceiver<T>) {
    tokio::sync::broadcast::channel(capacity)
}

/// The three public change channels.
#[derive(Debug, Clone)]
pub struct ChangeChannels {
    outputs: ChangeSender<OutputStatus>,
    sensors: ChangeSender<SensorStatus>,
    temperatures: ChangeSender<TemperatureStatus>,
}

impl ChangeChannels {
    pub fn new(capacity: usize) -> Self {
        let (outputs, _) = change_channel(capacity);
        let (sensors, _) = change_channel(capacity);
        let (temperatures, _) = change_channel(capacity);
        Self {
            outputs,
            sensors,
            temperatures,
        }
    }

    pub fn outputs(&self) -> ChangeReceiver<OutputStatus> {
        self.outputs.subscribe()
    }

    pub fn sensors(&self) -> ChangeReceiver<SensorStatus> {
        self.sensors.subscribe()
    }

    pub fn temperatures(&self) -> ChangeReceiver<TemperatureStatus> {
        self.temperatures.subscribe()
    }

    /// Send a change to its category's subscribers. Having no subscribers
    /// is fine.
    pub fn publish(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::Output(change) => {
                let _ = self.outputs.send(change);
            }
            ChangeEvent::Sensor(change) => {
                let _ = self.sensors.send(change);
            }
            ChangeEvent::Temperature(change) => {
                let _ = self.temperatures.send(change);
            }
            ChangeEvent::System(_) => {}
        }
    }
}
