//! Handlers for `/products`, `/categories`, `/tags` and `/product-details`.
//!
//! Reads are public. Every write requires an admin bearer token.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  catalog::{
    Category, NewCategory, NewProduct, NewProductDetail, NewTag, Product, ProductDetail,
    ProductDetailPatch, ProductPatch, ProductQuery, Tag, TagPatch,
  },
  store::DepotStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Products ─────────────────────────────────────────────────────────────────

/// `GET /products[?category=<name>&search=<text>]`
pub async fn list_products<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_products(&query).await?))
}

pub async fn create_product<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let product = state.service.create_product(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_product(id).await?))
}

pub async fn update_product<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.update_product(&auth.caller, id, patch).await?))
}

pub async fn delete_product<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_product(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Categories ───────────────────────────────────────────────────────────────

pub async fn list_categories<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_categories().await?))
}

pub async fn create_category<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let category = state.service.create_category(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_category(id).await?))
}

/// `PUT /categories/{id}`: body: `{"name":"..."}`
pub async fn rename_category<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<NewCategory>,
) -> Result<Json<Category>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.rename_category(&auth.caller, id, body).await?))
}

pub async fn delete_category<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_category(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Tags ─────────────────────────────────────────────────────────────────────

pub async fn list_tags<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_tags().await?))
}

/// `POST /tags`: body: `{"name":"..","product_ids":[..]}`
pub async fn create_tag<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewTag>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let tag = state.service.create_tag(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get_tag<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_tag(id).await?))
}

pub async fn update_tag<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<TagPatch>,
) -> Result<Json<Tag>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.update_tag(&auth.caller, id, patch).await?))
}

pub async fn delete_tag<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_tag(&auth.caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Product details ──────────────────────────────────────────────────────────

pub async fn list_product_details<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<ProductDetail>>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.list_product_details().await?))
}

/// `POST /product-details`: body: `{"product_id":..,"specifications":..,"warranty":..}`
pub async fn create_product_detail<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewProductDetail>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DepotStore + 'static,
{
  let detail = state.service.create_product_detail(&auth.caller, body).await?;
  Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /product-details/{product_id}`
pub async fn get_product_detail<S>(
  State(state): State<AppState<S>>,
  Path(product_id): Path<Uuid>,
) -> Result<Json<ProductDetail>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(state.service.get_product_detail(product_id).await?))
}

pub async fn update_product_detail<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(product_id): Path<Uuid>,
  Json(patch): Json<ProductDetailPatch>,
) -> Result<Json<ProductDetail>, ApiError>
where
  S: DepotStore + 'static,
{
  Ok(Json(
    state
      .service
      .update_product_detail(&auth.caller, product_id, patch)
      .await?,
  ))
}

pub async fn delete_product_detail<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DepotStore + 'static,
{
  state.service.delete_product_detail(&auth.caller, product_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
