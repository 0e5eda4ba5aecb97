//! The real-time hub: a [`Broadcaster`] over a `tokio::sync::broadcast`
//! channel, and the `GET /hub` WebSocket endpoint that drains it.
//!
//! Delivery is best-effort. Publishing with nobody connected is not an
//! error, and a client that falls more than `capacity` events behind skips
//! what it missed and keeps going.

use axum::{
  extract::{
    State, WebSocketUpgrade,
    ws::{Message, WebSocket},
  },
  response::Response,
};
use depot_core::{
  event::{Broadcaster, Event},
  store::DepotStore,
};
use futures::{SinkExt as _, StreamExt as _};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Fan-out point for change events. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct Hub {
  tx: broadcast::Sender<Event>,
}

impl Hub {
  /// A hub that buffers up to `capacity` events per subscriber.
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// A receiver that sees every event published from now on.
  pub fn subscribe(&self) -> broadcast::Receiver<Event> { self.tx.subscribe() }

  pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }
}

impl Broadcaster for Hub {
  fn broadcast(&self, event: Event) {
    let name = event.name();
    match self.tx.send(event) {
      Ok(receivers) => debug!(event = name, receivers, "event fanned out"),
      Err(_) => debug!(event = name, "no hub subscribers"),
    }
  }
}

// ─── WebSocket ────────────────────────────────────────────────────────────────

/// `GET /hub`: upgrade and stream every event as a JSON text frame.
pub async fn connect<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
  S: DepotStore + 'static,
{
  // Subscribe before the upgrade completes so nothing published in between
  // is missed.
  let rx = state.hub.subscribe();
  ws.on_upgrade(move |socket| serve_socket(socket, rx))
}

async fn serve_socket(socket: WebSocket, mut rx: broadcast::Receiver<Event>) {
  info!("hub client connected");
  let (mut sender, mut receiver) = socket.split();

  let mut send_task = tokio::spawn(async move {
    loop {
      let event = match rx.recv().await {
        Ok(event) => event,
        Err(RecvError::Lagged(skipped)) => {
          warn!(skipped, "hub client lagged; dropping missed events");
          continue;
        }
        Err(RecvError::Closed) => break,
      };

      let text = match serde_json::to_string(&event) {
        Ok(text) => text,
        Err(e) => {
          error!(error = %e, event = event.name(), "failed to serialise event");
          continue;
        }
      };

      if sender.send(Message::Text(text.into())).await.is_err() {
        break;
      }
    }
    debug!("hub send task finished");
  });

  // Client frames carry nothing; only watch for the connection going away.
  let mut recv_task = tokio::spawn(async move {
    while let Some(Ok(msg)) = receiver.next().await {
      if let Message::Close(_) = msg {
        break;
      }
    }
    debug!("hub receive task finished");
  });

  tokio::select! {
    _ = (&mut send_task) => recv_task.abort(),
    _ = (&mut recv_task) => send_task.abort(),
  }

  info!("hub client disconnected");
}
