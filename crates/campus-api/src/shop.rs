//! Handlers for the benefit shop: catalog, administration, and redemption.
//!
//! Redemption is the one money-like operation in the API. The handler only
//! checks the session and hands the rest to the store, which decides
//! atomically: a second redemption of the same benefit is a conflict even
//! when it races the first, and the balance is re-read inside the same
//! transaction that debits it.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use campus_core::{
  benefit::{Benefit, BenefitId, NewBenefit, RedeemedBenefit},
  store::RewardsStore,
  user::UserId,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth, error::ApiError};

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /shop/catalog` — every benefit currently offered.
pub async fn catalog<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Benefit>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  let benefits = state.store.list_benefits().await?;
  Ok(Json(benefits))
}

#[derive(Debug, Deserialize)]
pub struct CreateBenefitBody {
  pub name:        String,
  pub description: String,
  pub cost:        i64,
  pub expires_at:  Option<chrono::DateTime<chrono::Utc>>,
}

/// `POST /shop/benefits`
pub async fn create_benefit<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<CreateBenefitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  if body.name.trim().is_empty() {
    return Err(ApiError::InvalidInput("benefit name is required".into()));
  }
  if body.cost <= 0 {
    return Err(ApiError::InvalidInput("cost must be positive".into()));
  }

  let benefit = state
    .store
    .create_benefit(NewBenefit {
      name:        body.name,
      description: body.description,
      cost:        body.cost,
      expires_at:  body.expires_at,
    })
    .await?;

  tracing::info!(benefit_id = benefit.benefit_id, "benefit created");
  Ok((StatusCode::CREATED, Json(benefit)))
}

/// `DELETE /shop/benefits/:id`
pub async fn delete_benefit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<BenefitId>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_session(&headers, &state.sessions)?;

  state.store.delete_benefit(id).await?;
  Ok(Json(json!({ "status": "benefit deleted" })))
}

// ─── Redemption ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
  pub user_id:    UserId,
  pub benefit_id: BenefitId,
}

/// `POST /shop/redemptions` — spend points on a benefit.
///
/// The session must belong to the user named in the body; the claimed
/// balance is never taken from the client.
pub async fn redeem<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<RedeemBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, body.user_id)?;

  let redemption = state.store.redeem(body.user_id, body.benefit_id).await?;
  tracing::info!(
    user_id = redemption.user_id,
    benefit_id = redemption.benefit_id,
    "benefit redeemed"
  );
  Ok(Json(redemption))
}

/// `GET /users/:id/redemptions` — benefits the user has already claimed.
pub async fn user_redemptions<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  headers: HeaderMap,
) -> Result<Json<Vec<RedeemedBenefit>>, ApiError>
where
  S: RewardsStore,
  ApiError: From<S::Error>,
{
  auth::require_user(&headers, &state.sessions, id)?;

  let redemptions = state.store.redemptions(id).await?;
  Ok(Json(redemptions))
}
