//! Change notifications and the [`Broadcaster`] seam.
//!
//! After a mutating operation succeeds the service hands an [`Event`] to the
//! injected broadcaster. Delivery is best-effort: there is no
//! acknowledgement, no persistence and no replay. A client that misses
//! events re-fetches state over REST.

use serde::{Deserialize, Serialize};

use crate::{catalog::Product, order::Order, ticket::Ticket};

/// A named change event carrying the full affected record.
///
/// Serialised as `{"event": "TicketCreated", "payload": {...}}`. Deleted
/// events carry the record as it was just before removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "event", content = "payload")]
pub enum Event {
  TicketCreated(Ticket),
  TicketUpdated(Ticket),
  TicketDeleted(Ticket),
  ProductCreated(Product),
  ProductUpdated(Product),
  ProductDeleted(Product),
  OrderCreated(Order),
  OrderUpdated(Order),
  OrderDeleted(Order),
}

impl Event {
  pub fn name(&self) -> &'static str { self.into() }
}

/// Fire-and-forget fan-out to every connected client.
pub trait Broadcaster: Send + Sync {
  fn broadcast(&self, event: Event);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
  fn broadcast(&self, _event: Event) {}
}
