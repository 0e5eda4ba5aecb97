use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{Service, not_found, require_admin, require_owner};
use crate::{
  Error, Result,
  catalog::MAX_CENTS,
  event::Event,
  order::{NewOrder, NewOrderItem, Order, OrderItem, OrderPatch, OrderQuery, order_total},
  store::DepotStore,
  ticket::StatusLabel,
  user::Caller,
};

impl<S: DepotStore> Service<S> {
  /// Place an order, pricing every line from the current product prices.
  ///
  /// All lookups finish before the single insert, so a rejected order
  /// writes nothing.
  pub async fn create_order(&self, caller: &Caller, input: NewOrder) -> Result<Order> {
    let user_id = input.user_id.unwrap_or(caller.user_id);
    if user_id != caller.user_id && !caller.is_admin() {
      return Err(Error::Forbidden(
        "only admins may place orders for another user".into(),
      ));
    }

    self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::Validation("invalid user id".into()))?;

    let (items, total_cents) = self.price_items(input.items).await?;

    let order = Order {
      order_id: Uuid::new_v4(),
      user_id,
      items,
      total_cents,
      status: StatusLabel::pending(),
      created_at: Utc::now(),
      updated_at: None,
    };

    self.store.insert_order(&order).await.map_err(Error::store)?;
    info!(order_id = %order.order_id, user_id = %user_id, total_cents, "order created");

    self.publish(Event::OrderCreated(order.clone()));
    Ok(order)
  }

  pub async fn get_order(&self, caller: &Caller, id: Uuid) -> Result<Order> {
    let order = self.find_order(id).await?;
    require_owner(caller, order.user_id, "order")?;
    Ok(order)
  }

  /// Admins see every order; customers only their own.
  pub async fn list_orders(&self, caller: &Caller, query: OrderQuery) -> Result<Vec<Order>> {
    let mut query = query;
    if !caller.is_admin() {
      match query.user_id {
        Some(user_id) if user_id != caller.user_id => {
          return Err(Error::Forbidden("not allowed to list these orders".into()));
        }
        _ => query.user_id = Some(caller.user_id),
      }
    }
    self.store.list_orders(&query).await.map_err(Error::store)
  }

  pub async fn update_order(
    &self,
    caller: &Caller,
    id: Uuid,
    patch: OrderPatch,
  ) -> Result<Order> {
    let mut order = self.find_order(id).await?;
    require_owner(caller, order.user_id, "order")?;

    if let Some(label) = patch.status {
      order.status = StatusLabel::new(label)?;
    }
    if let Some(items) = patch.items {
      let (items, total_cents) = self.price_items(items).await?;
      order.items = items;
      order.total_cents = total_cents;
    }
    order.updated_at = Some(Utc::now());

    self.save_order(order).await
  }

  pub async fn set_order_status(
    &self,
    caller: &Caller,
    id: Uuid,
    status: String,
  ) -> Result<Order> {
    require_admin(caller)?;
    let mut order = self.find_order(id).await?;
    order.status = StatusLabel::new(status)?;
    order.updated_at = Some(Utc::now());

    self.save_order(order).await
  }

  pub async fn delete_order(&self, caller: &Caller, id: Uuid) -> Result<()> {
    let order = self.find_order(id).await?;
    require_owner(caller, order.user_id, "order")?;

    if !self.store.delete_order(id).await.map_err(Error::store)? {
      return Err(not_found("order", id));
    }
    info!(order_id = %id, "order deleted");

    self.publish(Event::OrderDeleted(order));
    Ok(())
  }

  async fn find_order(&self, id: Uuid) -> Result<Order> {
    self
      .store
      .get_order(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("order", id))
  }

  async fn save_order(&self, order: Order) -> Result<Order> {
    if !self.store.update_order(&order).await.map_err(Error::store)? {
      return Err(not_found("order", order.order_id));
    }
    info!(order_id = %order.order_id, status = %order.status, "order updated");

    self.publish(Event::OrderUpdated(order.clone()));
    Ok(order)
  }

  /// Re-read each referenced product and record its current price.
  async fn price_items(&self, items: Vec<NewOrderItem>) -> Result<(Vec<OrderItem>, u64)> {
    let mut priced = Vec::with_capacity(items.len());
    for item in items {
      if item.quantity == 0 {
        return Err(Error::Validation("quantity must be at least 1".into()));
      }
      let product = self
        .store
        .get_product(item.product_id)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| {
          Error::Validation(format!("product with id {} not found", item.product_id))
        })?;
      priced.push(OrderItem {
        product_id:           item.product_id,
        quantity:             item.quantity,
        price_at_order_cents: product.price_cents,
      });
    }

    let total = order_total(&priced)
      .filter(|total| *total <= MAX_CENTS)
      .ok_or_else(|| Error::Validation("order total is too large".into()))?;
    Ok((priced, total))
  }
}
