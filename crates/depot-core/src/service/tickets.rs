use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{Service, not_found, require_owner, required, required_opt};
use crate::{
  Error, Result,
  event::Event,
  store::DepotStore,
  ticket::{NewTicket, StatusLabel, Ticket, TicketPatch, TicketQuery},
  user::Caller,
};

impl<S: DepotStore> Service<S> {
  /// Raise a ticket owned by `caller` and broadcast `TicketCreated`.
  pub async fn create_ticket(&self, caller: &Caller, input: NewTicket) -> Result<Ticket> {
    let title = required("title", input.title)?;
    let description = required("description", input.description)?;
    let status = match input.status {
      Some(label) => StatusLabel::new(label)?,
      None => StatusLabel::open(),
    };

    let ticket = Ticket {
      ticket_id: Uuid::new_v4(),
      title,
      description,
      status,
      admin_comment: None,
      user_id: caller.user_id,
      created_at: Utc::now(),
      updated_at: None,
    };

    self.store.insert_ticket(&ticket).await.map_err(Error::store)?;
    info!(ticket_id = %ticket.ticket_id, user_id = %ticket.user_id, "ticket created");

    self.publish(Event::TicketCreated(ticket.clone()));
    Ok(ticket)
  }

  pub async fn get_ticket(&self, id: Uuid) -> Result<Ticket> {
    self
      .store
      .get_ticket(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("ticket", id))
  }

  pub async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
    self.store.list_tickets(query).await.map_err(Error::store)
  }

  /// Apply `patch` as the ticket's owner or an admin. Only admins may set
  /// `admin_comment`.
  pub async fn update_ticket(
    &self,
    caller: &Caller,
    id: Uuid,
    patch: TicketPatch,
  ) -> Result<Ticket> {
    let mut ticket = self.get_ticket(id).await?;
    require_owner(caller, ticket.user_id, "ticket")?;

    if patch.admin_comment.is_some() && !caller.is_admin() {
      return Err(Error::Forbidden("only admins may comment on tickets".into()));
    }

    if let Some(title) = required_opt("title", patch.title)? {
      ticket.title = title;
    }
    if let Some(description) = required_opt("description", patch.description)? {
      ticket.description = description;
    }
    if let Some(label) = patch.status {
      ticket.status = StatusLabel::new(label)?;
    }
    if let Some(comment) = patch.admin_comment {
      let comment = comment.trim().to_owned();
      ticket.admin_comment = (!comment.is_empty()).then_some(comment);
    }
    ticket.updated_at = Some(Utc::now());

    if !self.store.update_ticket(&ticket).await.map_err(Error::store)? {
      return Err(not_found("ticket", id));
    }
    info!(ticket_id = %id, status = %ticket.status, "ticket updated");

    self.publish(Event::TicketUpdated(ticket.clone()));
    Ok(ticket)
  }

  pub async fn delete_ticket(&self, caller: &Caller, id: Uuid) -> Result<()> {
    let ticket = self.get_ticket(id).await?;
    require_owner(caller, ticket.user_id, "ticket")?;

    if !self.store.delete_ticket(id).await.map_err(Error::store)? {
      return Err(not_found("ticket", id));
    }
    info!(ticket_id = %id, "ticket deleted");

    self.publish(Event::TicketDeleted(ticket));
    Ok(())
  }
}
