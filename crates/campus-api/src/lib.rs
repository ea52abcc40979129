//! JSON REST API for Campus Rewards.
//!
//! Exposes an axum [`Router`] backed by any [`campus_core::store::RewardsStore`].
//! Sessions live in an in-process [`SessionStore`]; every route except
//! sign-up and login requires the `x-session-key` header.

pub mod auth;
pub mod challenges;
pub mod error;
pub mod events;
pub mod shop;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use campus_core::{session::SessionStore, store::RewardsStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Per-operation storage deadline in seconds. Defaults when absent.
  pub db_timeout_secs: Option<u64>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RewardsStore> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionStore>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Campus Rewards server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RewardsStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  Router::new()
    // Accounts and sessions
    .route("/users/signup",  post(users::signup::<S>))
    .route("/users/login",   post(users::login::<S>))
    .route("/users/signout", post(users::signout::<S>))
    // Per-user resources (session must match {id})
    .route("/users/{id}/profile",        get(users::profile::<S>))
    .route("/users/{id}/photo",          put(users::set_photo::<S>))
    .route("/users/{id}/points",         get(users::points::<S>))
    .route("/users/{id}/points/history", get(users::points_history::<S>))
    .route("/users/{id}/redemptions",    get(shop::user_redemptions::<S>))
    .route("/users/{id}/events",         get(events::user_events::<S>))
    .route("/users/{id}/challenges",     get(challenges::user_challenges::<S>))
    // Benefit shop
    .route("/shop/catalog",       get(shop::catalog::<S>))
    .route("/shop/benefits",      post(shop::create_benefit::<S>))
    .route("/shop/benefits/{id}", delete(shop::delete_benefit::<S>))
    .route("/shop/redemptions",   post(shop::redeem::<S>))
    // Events
    .route("/events",                 get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}/attendance", post(events::attend::<S>))
    // Challenges
    .route("/challenges",                   get(challenges::list::<S>).post(challenges::create::<S>))
    .route("/challenges/{id}/registration", post(challenges::register::<S>))
    .route("/challenges/{id}/completion",   post(challenges::complete::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
