use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{Service, not_found, require_admin, required, required_opt};
use crate::{
  Error, Result,
  catalog::{
    Category, MAX_CENTS, NewCategory, NewProduct, NewProductDetail, NewTag, Product,
    ProductDetail, ProductDetailPatch, ProductPatch, ProductQuery, Tag, TagPatch,
    normalize_category_names, normalize_product_ids,
  },
  event::Event,
  store::DepotStore,
  user::Caller,
};

// ─── Products ────────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn create_product(&self, caller: &Caller, input: NewProduct) -> Result<Product> {
    require_admin(caller)?;

    let now = Utc::now();
    let product = Product {
      product_id:   Uuid::new_v4(),
      title:        required("title", input.title)?,
      description:  input.description.trim().to_owned(),
      image_url:    input.image_url.trim().to_owned(),
      barcode:      required("barcode", input.barcode)?,
      price_cents:  checked_price(input.price_cents)?,
      release_date: input.release_date.unwrap_or(now),
      categories:   normalize_category_names(input.categories),
      created_at:   now,
      updated_at:   None,
    };

    self.store.insert_product(&product).await.map_err(Error::store)?;
    info!(product_id = %product.product_id, categories = ?product.categories, "product created");

    self.publish(Event::ProductCreated(product.clone()));
    Ok(product)
  }

  pub async fn get_product(&self, id: Uuid) -> Result<Product> {
    self
      .store
      .get_product(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("product", id))
  }

  pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
    self.store.list_products(query).await.map_err(Error::store)
  }

  pub async fn update_product(
    &self,
    caller: &Caller,
    id: Uuid,
    patch: ProductPatch,
  ) -> Result<Product> {
    require_admin(caller)?;
    let mut product = self.get_product(id).await?;

    if let Some(title) = required_opt("title", patch.title)? {
      product.title = title;
    }
    if let Some(description) = patch.description {
      product.description = description.trim().to_owned();
    }
    if let Some(image_url) = patch.image_url {
      product.image_url = image_url.trim().to_owned();
    }
    if let Some(barcode) = required_opt("barcode", patch.barcode)? {
      product.barcode = barcode;
    }
    if let Some(price) = patch.price_cents {
      product.price_cents = checked_price(price)?;
    }
    if let Some(release_date) = patch.release_date {
      product.release_date = release_date;
    }
    if let Some(categories) = patch.categories {
      product.categories = normalize_category_names(categories);
    }
    product.updated_at = Some(Utc::now());

    if !self.store.update_product(&product).await.map_err(Error::store)? {
      return Err(not_found("product", id));
    }
    info!(product_id = %id, "product updated");

    self.publish(Event::ProductUpdated(product.clone()));
    Ok(product)
  }

  pub async fn delete_product(&self, caller: &Caller, id: Uuid) -> Result<()> {
    require_admin(caller)?;
    let product = self.get_product(id).await?;

    if !self.store.delete_product(id).await.map_err(Error::store)? {
      return Err(not_found("product", id));
    }
    info!(product_id = %id, "product deleted");

    self.publish(Event::ProductDeleted(product));
    Ok(())
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn list_categories(&self) -> Result<Vec<Category>> {
    self.store.list_categories().await.map_err(Error::store)
  }

  pub async fn get_category(&self, id: Uuid) -> Result<Category> {
    self
      .store
      .get_category(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("category", id))
  }

  pub async fn create_category(&self, caller: &Caller, input: NewCategory) -> Result<Category> {
    require_admin(caller)?;
    let name = required("name", input.name)?;
    self.ensure_category_name_free(&name, None).await?;

    let category = Category {
      category_id: Uuid::new_v4(),
      name,
      product_ids: Vec::new(),
      created_at:  Utc::now(),
      updated_at:  None,
    };

    self.store.insert_category(&category).await.map_err(Error::store)?;
    info!(category_id = %category.category_id, name = %category.name, "category created");
    Ok(category)
  }

  pub async fn rename_category(
    &self,
    caller: &Caller,
    id: Uuid,
    input: NewCategory,
  ) -> Result<Category> {
    require_admin(caller)?;
    let mut category = self.get_category(id).await?;
    let name = required("name", input.name)?;
    self.ensure_category_name_free(&name, Some(id)).await?;

    category.name = name;
    category.updated_at = Some(Utc::now());

    if !self.store.update_category(&category).await.map_err(Error::store)? {
      return Err(not_found("category", id));
    }
    info!(category_id = %id, name = %category.name, "category renamed");
    Ok(category)
  }

  pub async fn delete_category(&self, caller: &Caller, id: Uuid) -> Result<()> {
    require_admin(caller)?;
    if !self.store.delete_category(id).await.map_err(Error::store)? {
      return Err(not_found("category", id));
    }
    info!(category_id = %id, "category deleted");
    Ok(())
  }

  async fn ensure_category_name_free(&self, name: &str, except: Option<Uuid>) -> Result<()> {
    let existing = self
      .store
      .find_category_by_name(name)
      .await
      .map_err(Error::store)?;
    match existing {
      Some(c) if Some(c.category_id) != except => {
        Err(Error::Validation(format!("category {name:?} already exists")))
      }
      _ => Ok(()),
    }
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn list_tags(&self) -> Result<Vec<Tag>> {
    self.store.list_tags().await.map_err(Error::store)
  }

  pub async fn get_tag(&self, id: Uuid) -> Result<Tag> {
    self
      .store
      .get_tag(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("tag", id))
  }

  /// Every id in `product_ids` must name an existing product.
  pub async fn create_tag(&self, caller: &Caller, input: NewTag) -> Result<Tag> {
    require_admin(caller)?;
    let name = required("name", input.name)?;
    self.ensure_tag_name_free(&name, None).await?;
    let product_ids = self.existing_products(input.product_ids).await?;

    let tag = Tag {
      tag_id: Uuid::new_v4(),
      name,
      product_ids,
      created_at: Utc::now(),
      updated_at: None,
    };

    self.store.insert_tag(&tag).await.map_err(Error::store)?;
    info!(tag_id = %tag.tag_id, name = %tag.name, products = tag.product_ids.len(), "tag created");
    Ok(tag)
  }

  pub async fn update_tag(&self, caller: &Caller, id: Uuid, patch: TagPatch) -> Result<Tag> {
    require_admin(caller)?;
    let mut tag = self.get_tag(id).await?;

    if let Some(name) = required_opt("name", patch.name)? {
      self.ensure_tag_name_free(&name, Some(id)).await?;
      tag.name = name;
    }
    if let Some(product_ids) = patch.product_ids {
      tag.product_ids = self.existing_products(product_ids).await?;
    }
    tag.updated_at = Some(Utc::now());

    if !self.store.update_tag(&tag).await.map_err(Error::store)? {
      return Err(not_found("tag", id));
    }
    info!(tag_id = %id, name = %tag.name, "tag updated");
    Ok(tag)
  }

  pub async fn delete_tag(&self, caller: &Caller, id: Uuid) -> Result<()> {
    require_admin(caller)?;
    if !self.store.delete_tag(id).await.map_err(Error::store)? {
      return Err(not_found("tag", id));
    }
    info!(tag_id = %id, "tag deleted");
    Ok(())
  }

  async fn ensure_tag_name_free(&self, name: &str, except: Option<Uuid>) -> Result<()> {
    let taken = self
      .store
      .find_tag_by_name(name)
      .await
      .map_err(Error::store)?
      .is_some_and(|t| Some(t.tag_id) != except);
    if taken {
      return Err(Error::Validation(format!("tag {name:?} already exists")));
    }
    Ok(())
  }

  async fn existing_products(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    let ids = normalize_product_ids(ids);
    for id in &ids {
      self.get_product(*id).await.map_err(|e| match e {
        Error::NotFound(_) => Error::Validation(format!("product with id {id} not found")),
        other => other,
      })?;
    }
    Ok(ids)
  }
}

// ─── Product details ─────────────────────────────────────────────────────────

impl<S: DepotStore> Service<S> {
  pub async fn list_product_details(&self) -> Result<Vec<ProductDetail>> {
    self.store.list_product_details().await.map_err(Error::store)
  }

  pub async fn get_product_detail(&self, product_id: Uuid) -> Result<ProductDetail> {
    self
      .store
      .get_product_detail(product_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found("details for product", product_id))
  }

  /// Attach details to a product that has none yet.
  pub async fn create_product_detail(
    &self,
    caller: &Caller,
    input: NewProductDetail,
  ) -> Result<ProductDetail> {
    require_admin(caller)?;
    let product_id = input.product_id;
    self.existing_products(vec![product_id]).await?;

    let existing = self
      .store
      .get_product_detail(product_id)
      .await
      .map_err(Error::store)?;
    if existing.is_some() {
      return Err(Error::Validation(format!(
        "product {product_id} already has details"
      )));
    }

    let detail = ProductDetail {
      product_id,
      specifications: input.specifications.trim().to_owned(),
      warranty: input.warranty.trim().to_owned(),
      created_at: Utc::now(),
      updated_at: None,
    };

    self.store.insert_product_detail(&detail).await.map_err(Error::store)?;
    info!(product_id = %product_id, "product details created");
    Ok(detail)
  }

  pub async fn update_product_detail(
    &self,
    caller: &Caller,
    product_id: Uuid,
    patch: ProductDetailPatch,
  ) -> Result<ProductDetail> {
    require_admin(caller)?;
    let mut detail = self.get_product_detail(product_id).await?;

    if let Some(specifications) = patch.specifications {
      detail.specifications = specifications.trim().to_owned();
    }
    if let Some(warranty) = patch.warranty {
      detail.warranty = warranty.trim().to_owned();
    }
    detail.updated_at = Some(Utc::now());

    if !self.store.update_product_detail(&detail).await.map_err(Error::store)? {
      return Err(not_found("details for product", product_id));
    }
    info!(product_id = %product_id, "product details updated");
    Ok(detail)
  }

  pub async fn delete_product_detail(&self, caller: &Caller, product_id: Uuid) -> Result<()> {
    require_admin(caller)?;
    if !self
      .store
      .delete_product_detail(product_id)
      .await
      .map_err(Error::store)?
    {
      return Err(not_found("details for product", product_id));
    }
    info!(product_id = %product_id, "product details deleted");
    Ok(())
  }
}

fn checked_price(cents: u64) -> Result<u64> {
  if cents > MAX_CENTS {
    return Err(Error::Validation(format!(
      "price_cents must be at most {MAX_CENTS}"
    )));
  }
  Ok(cents)
}
