// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! In-memory link for tests and simulations.
//!
//! [`link_pair`] returns the client's [`FrameLink`] and a [`PanelEnd`] that
//! plays the panel: it sees every frame the client sends and can push
//! frames back.

use serde_json::Value;
use tokio::sync::mpsc;

use super::FrameLink;
use crate::error::{Lares4Error, Result};

/// The panel's side of an in-memory link.
#[derive(Debug)]
pub struct PanelEnd {
    to_client: mpsc::Sender<String>,
    from_client: mpsc::Receiver<String>,
}

/// Create a connected client link and panel end.
pub fn link_pair(buffer_size: usize) -> (FrameLink, PanelEnd) {
    let (client_to_panel_tx, client_to_panel_rx) = mpsc::channel(buffer_size);
    let (panel_to_client_tx, panel_to_client_rx) = mpsc::channel(buffer_size);
    (
        FrameLink {
            outgoing: client_to_panel_tx,
            incoming: panel_to_client_rx,
        },
        PanelEnd {
            to_client: panel_to_client_tx,
            from_client: client_to_panel_rx,
        },
    )
}

impl PanelEnd {
    /// Next raw frame from the client, `None` once the client hung up.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next frame from the client, parsed as JSON.
    pub async fn recv_json(&mut self) -> Result<Value> {
        let text = self.recv_text().await.ok_or(Lares4Error::Disconnected)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.to_client
            .send(text.into())
            .await
            .map_err(|_| Lares4Error::ChannelClosed)
    }

    pub async fn send_json(&self, frame: &Value) -> Result<()> {
        self.send_text(frame.to_string()).await
    }

    /// Whether the client side has gone away.
    pub fn is_closed(&self) -> bool {
        self.to_client.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut link, mut panel) = link_pair(4);

        link.outgoing.send("{\"CMD\":\"LOGIN\"}".to_string()).await.unwrap();
        assert_eq!(panel.recv_json().await.unwrap(), json!({"CMD": "LOGIN"}));

        panel.send_json(&json!({"CMD": "LOGIN_RES"})).await.unwrap();
        assert_eq!(link.incoming.recv().await.unwrap(), r#"{"CMD":"LOGIN_RES"}"#);
    }

    #[tokio::test]
    async fn test_hang_up_is_visible() {
        let (link, mut panel) = link_pair(4);
        drop(link);
        assert!(panel.recv_text().await.is_none());
        assert!(panel.is_closed());
        assert!(matches!(
            panel.send_text("x").await,
            Err(Lares4Error::ChannelClosed)
        ));
    }
}
