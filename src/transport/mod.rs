// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

pub mod memory;
pub mod websocket;

use tokio::sync::mpsc;

/// The client's view of a connection: text frames out, text frames in.
///
/// When the connection goes away the incoming channel closes. Dropping the
/// outgoing sender closes the connection.
#[derive(Debug)]
pub struct FrameLink {
    pub outgoing: mpsc::Sender<String>,
    pub incoming: mpsc::Receiver<String>,
}
