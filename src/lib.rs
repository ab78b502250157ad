// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

pub mod common;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod storage;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

/// Assembles the full application router. Split out of `main` so the
/// integration tests can drive the HTTP surface without binding a socket.
pub fn app(app_state: AppState) -> Router {
    // Public routes: signup and login have no session yet, and logout must
    // work even with a stale cookie.
    let public_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    let brewery_routes = Router::new()
        .route(
            "/brewery",
            get(handlers::brewery::get_own_brewery)
                .put(handlers::brewery::update_own_brewery)
                .delete(handlers::brewery::delete_own_brewery),
        )
        .route(
            "/brewery/users",
            get(handlers::brewery::list_members).post(handlers::brewery::add_member),
        )
        .route("/brewery/users/{id}", delete(handlers::brewery::remove_member))
        .route("/breweries", get(handlers::brewery::list_breweries));

    let inventory_routes = Router::new()
        .route(
            "/inventory",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route(
            "/inventory/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        );

    let equipment_routes = Router::new()
        .route(
            "/equipment",
            get(handlers::equipment::list_equipment).post(handlers::equipment::create_equipment),
        )
        .route(
            "/equipment/{id}",
            get(handlers::equipment::get_equipment)
                .put(handlers::equipment::update_equipment)
                .delete(handlers::equipment::delete_equipment),
        );

    let recipe_routes = Router::new()
        .route(
            "/recipes",
            get(handlers::recipes::list_recipes).post(handlers::recipes::create_recipe),
        )
        .route(
            "/recipes/{id}",
            get(handlers::recipes::get_recipe)
                .put(handlers::recipes::update_recipe)
                .delete(handlers::recipes::delete_recipe),
        );

    let schedule_routes = Router::new()
        .route(
            "/schedules",
            get(handlers::schedules::list_schedules).post(handlers::schedules::create_schedule),
        )
        .route(
            "/schedules/{id}",
            get(handlers::schedules::get_schedule)
                .put(handlers::schedules::update_schedule)
                .delete(handlers::schedules::delete_schedule),
        );

    let source_routes = Router::new()
        .route(
            "/ingredient-sources",
            get(handlers::sources::list_sources).post(handlers::sources::create_source),
        )
        .route(
            "/ingredient-sources/{id}",
            get(handlers::sources::get_source)
                .put(handlers::sources::update_source)
                .delete(handlers::sources::delete_source),
        );

    let price_history_routes = Router::new()
        .route(
            "/price-history",
            get(handlers::price_history::list_entries).post(handlers::price_history::create_entry),
        )
        .route(
            "/price-history/ingredient/{id}",
            get(handlers::price_history::list_for_ingredient),
        )
        .route(
            "/price-history/{id}",
            put(handlers::price_history::update_entry).delete(handlers::price_history::delete_entry),
        );

    // Everything below requires a live session; the guard resolves the
    // cookie to a CurrentUser (plus a TenantContext when the user belongs
    // to a brewery) before any handler runs.
    let protected_routes = Router::new()
        .route("/auth/user", get(handlers::auth::me))
        .merge(brewery_routes)
        .merge(inventory_routes)
        .merge(equipment_routes)
        .merge(recipe_routes)
        .merge(schedule_routes)
        .merge(source_routes)
        .merge(price_history_routes)
        .route("/stats", get(handlers::stats::get_stats))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", public_routes)
        .nest("/api", protected_routes)
        .with_state(app_state)
}
