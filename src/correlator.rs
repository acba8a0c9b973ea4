// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Bootstrap response routing.
//!
//! The three bootstrap queries are answered on the same socket, in any
//! order, and the replies carry nothing that ties them to a request ID. Each
//! inbound payload is classified by its top-level keys, decoded into the
//! matching typed reply and used to settle that query's pending request.

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Lares4Error, Result};
use crate::protocol::{Accessories, BootstrapKind, BootstrapReply, Configuration, LiveStatus};

/// Everything the three bootstrap queries returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub accessories: Accessories,
    pub status: LiveStatus,
    pub configuration: Configuration,
}

/// Settling side of the pending bootstrap requests.
#[derive(Debug)]
pub struct Correlator {
    accessories: Option<oneshot::Sender<Result<Accessories>>>,
    status: Option<oneshot::Sender<Result<LiveStatus>>>,
    configuration: Option<oneshot::Sender<Result<Configuration>>>,
}

/// Awaiting side of the pending bootstrap requests.
#[derive(Debug)]
pub struct PendingBootstrap {
    accessories: oneshot::Receiver<Result<Accessories>>,
    status: oneshot::Receiver<Result<LiveStatus>>,
    configuration: oneshot::Receiver<Result<Configuration>>,
}

impl Correlator {
    pub fn new() -> (Self, PendingBootstrap) {
        let (accessories_tx, accessories_rx) = oneshot::channel();
        let (status_tx, status_rx) = oneshot::channel();
        let (configuration_tx, configuration_rx) = oneshot::channel();
        (
            Self {
                accessories: Some(accessories_tx),
                status: Some(status_tx),
                configuration: Some(configuration_tx),
            },
            PendingBootstrap {
                accessories: accessories_rx,
                status: status_rx,
                configuration: configuration_rx,
            },
        )
    }

    /// Route one inbound payload.
    ///
    /// Returns the query it settled, successfully or not. Payloads that match
    /// no query, or answer one that is already settled, are ignored.
    pub fn route(&mut self, payload: &Value) -> Option<BootstrapKind> {
        let kind = BootstrapReply::classify(payload)?;
        if !self.is_pending(kind) {
            debug!("Ignoring duplicate {} reply", kind);
            return None;
        }

        match BootstrapReply::decode(kind, payload) {
            Ok(BootstrapReply::Accessories(reply)) => settle(&mut self.accessories, Ok(reply)),
            Ok(BootstrapReply::Status(reply)) => settle(&mut self.status, Ok(reply)),
            Ok(BootstrapReply::Configuration(reply)) => {
                settle(&mut self.configuration, Ok(reply))
            }
            Err(e) => match kind {
                BootstrapKind::Accessories => settle(&mut self.accessories, Err(e)),
                BootstrapKind::Status => settle(&mut self.status, Err(e)),
                BootstrapKind::Configuration => settle(&mut self.configuration, Err(e)),
            },
        }
        debug!("Settled {} query", kind);
        Some(kind)
    }

    pub fn is_pending(&self, kind: BootstrapKind) -> bool {
        match kind {
            BootstrapKind::Accessories => self.accessories.is_some(),
            BootstrapKind::Status => self.status.is_some(),
            BootstrapKind::Configuration => self.configuration.is_some(),
        }
    }

    /// All three queries settled.
    pub fn is_complete(&self) -> bool {
        BootstrapKind::PRIORITY
            .into_iter()
            .all(|kind| !self.is_pending(kind))
    }
}

fn settle<T>(slot: &mut Option<oneshot::Sender<Result<T>>>, outcome: Result<T>) {
    if let Some(tx) = slot.take() {
        // receiver gone means the bootstrap was already abandoned
        let _ = tx.send(outcome);
    }
}

impl PendingBootstrap {
    /// Wait for all three replies. The first failure fails the whole join
    /// without waiting for the others.
    pub async fn join(self) -> Result<Snapshot> {
        let PendingBootstrap {
            accessories,
            status,
            configuration,
        } = self;
        let accessories =
            async move { accessories.await.map_err(|_| Lares4Error::ChannelClosed)? };
        let status = async move { status.await.map_err(|_| Lares4Error::ChannelClosed)? };
        let configuration =
            async move { configuration.await.map_err(|_| Lares4Error::ChannelClosed)? };

        let (accessories, status, configuration) =
            tokio::try_join!(accessories, status, configuration)?;
        Ok(Snapshot {
            accessories,
            status,
            configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accessories() -> Value {
        json!({"OUTPUTS": [{"ID": "1", "CAT": "LIGHT"}], "BUS_HAS": []})
    }

    fn status() -> Value {
        json!({
            "STATUS_OUTPUTS": [{"ID": "1", "STA": "OFF"}],
            "STATUS_SYSTEM": [{"ID": "1"}],
            "STATUS_BUS_HA_SENSORS": [],
            "STATUS_TEMPERATURES": []
        })
    }

    fn configuration() -> Value {
        json!({"CFG_THERMOSTATS": [], "SCENARIOS": [{"ID": "1", "CAT": "ARM"}], "PRG_OUTPUTS": []})
    }

    #[tokio::test]
    async fn test_routes_replies_in_any_order() {
        let (mut correlator, pending) = Correlator::new();
        assert_eq!(
            correlator.route(&configuration()),
            Some(BootstrapKind::Configuration)
        );
        assert_eq!(correlator.route(&status()), Some(BootstrapKind::Status));
        assert!(!correlator.is_complete());
        assert_eq!(
            correlator.route(&accessories()),
            Some(BootstrapKind::Accessories)
        );
        assert!(correlator.is_complete());

        let snapshot = pending.join().await.unwrap();
        assert_eq!(snapshot.accessories.outputs[0].category, "LIGHT");
        assert_eq!(snapshot.status.outputs[0].state, "OFF");
        assert_eq!(snapshot.configuration.scenarios[0].category, "ARM");
    }

    #[tokio::test]
    async fn test_unmatched_and_duplicate_payloads_ignored() {
        let (mut correlator, _pending) = Correlator::new();
        assert_eq!(correlator.route(&json!({"RESULT": "OK"})), None);
        assert_eq!(correlator.route(&json!(null)), None);
        assert_eq!(correlator.route(&status()), Some(BootstrapKind::Status));
        assert_eq!(correlator.route(&status()), None);
        assert!(correlator.is_pending(BootstrapKind::Accessories));
        assert!(!correlator.is_pending(BootstrapKind::Status));
    }

    #[tokio::test]
    async fn test_malformed_reply_fails_join_immediately() {
        let (mut correlator, pending) = Correlator::new();
        // accessories and status never arrive; the join must not wait for them
        correlator.route(&json!({"CFG_THERMOSTATS": []}));
        match pending.join().await {
            Err(Lares4Error::BootstrapFailed { query, .. }) => {
                assert_eq!(query, BootstrapKind::Configuration)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_correlator_closes_join() {
        let (correlator, pending) = Correlator::new();
        drop(correlator);
        assert!(matches!(
            pending.join().await,
            Err(Lares4Error::ChannelClosed)
        ));
    }
}
