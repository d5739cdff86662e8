//! Storefront routes: catalog browsing, the user's product collection, and
//! profile statistics.
//!
//! JSON API Endpoints:
//! - `POST /api/register`                       — create an account + session
//! - `POST /api/login`                          — open a session
//! - `POST /api/logout`                         — close the current session
//! - `GET  /api/products`                       — upstream catalog passthrough
//! - `GET  /api/collection/products`            — list the caller's line items
//! - `POST /api/collection/products`            — add or increment a product
//! - `POST /api/collection/products/quantity`   — increase/decrease/remove
//! - `GET  /api/profile`                        — user + derived statistics
//! - `POST /api/profile`                        — update name/username/email

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use snapshop_catalog::CatalogFetchError;
use snapshop_core::collection::{AddProductInput, QuantityAction};
use snapshop_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use snapshop_core::domain::product::ProductDescriptor;
use snapshop_core::domain::user::User;
use snapshop_core::stats::ProfileStatistics;
use snapshop_db::repositories::{LineItemRepository, SqlLineItemRepository};

use crate::auth::{self, domain_error, repository_error, ApiError, AppState, AuthUser};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub products: Vec<ProductDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CatalogFetchError>,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub status: &'static str,
    pub products: Vec<LineItem>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub status: &'static str,
    pub message: String,
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub status: &'static str,
    pub message: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub product_id: i64,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub status: &'static str,
    pub user: User,
    pub statistics: ProfileStatistics,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/products", get(list_products))
        .route("/api/collection/products", get(list_collection).post(add_product))
        .route("/api/collection/products/quantity", post(update_quantity))
        .route("/api/profile", get(get_profile).post(auth::update_profile))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Catalog passthrough. Upstream failures degrade to an empty product list
/// plus a message; this endpoint never fails on the upstream's behalf.
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Json<CatalogResponse> {
    let fetch = state.catalog.fetch_catalog().await;
    Json(CatalogResponse { products: fetch.products, error: fetch.error })
}

pub async fn list_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CollectionResponse>, (StatusCode, Json<ApiError>)> {
    let repo = SqlLineItemRepository::new(state.db_pool.clone());
    let products = repo.list_for_user(user.id).await.map_err(repository_error)?;
    Ok(Json(CollectionResponse { status: "success", products }))
}

pub async fn add_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<AddProductInput>,
) -> Result<Json<AddResponse>, (StatusCode, Json<ApiError>)> {
    input.validate().map_err(domain_error)?;

    let repo = SqlLineItemRepository::new(state.db_pool.clone());
    let outcome = repo
        .add_or_increment(NewLineItem::from_input(user.id, &input))
        .await
        .map_err(repository_error)?;

    let message = if outcome.created {
        format!("{} added to your collection.", input.title)
    } else {
        format!("Increased quantity of {}.", input.title)
    };

    info!(
        event_name = "collection.product.added",
        user_id = user.id.0,
        line_item_id = outcome.line_item_id.0,
        quantity = outcome.quantity,
        created = outcome.created,
        "product added to collection"
    );

    Ok(Json(AddResponse {
        status: "success",
        message,
        product_id: outcome.line_item_id.0,
        quantity: outcome.quantity,
    }))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<QuantityResponse>, (StatusCode, Json<ApiError>)> {
    let action: QuantityAction = request.action.parse().map_err(domain_error)?;

    let repo = SqlLineItemRepository::new(state.db_pool.clone());
    let quantity = repo
        .apply_quantity_action(user.id, LineItemId(request.product_id), action)
        .await
        .map_err(repository_error)?;

    let message = if quantity == 0 {
        "Product removed from your collection.".to_string()
    } else {
        format!("Quantity updated to {quantity}.")
    };

    info!(
        event_name = "collection.quantity.changed",
        user_id = user.id.0,
        line_item_id = request.product_id,
        action = action.as_str(),
        quantity,
        "collection quantity changed"
    );

    Ok(Json(QuantityResponse { status: "success", message, quantity }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ApiError>)> {
    let repo = SqlLineItemRepository::new(state.db_pool.clone());
    let items = repo.list_for_user(user.id).await.map_err(repository_error)?;
    let statistics = ProfileStatistics::compute(&items);

    Ok(Json(ProfileResponse { status: "success", user, statistics }))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use httpmock::prelude::*;
    use rust_decimal::Decimal;
    use snapshop_catalog::CatalogClient;
    use snapshop_core::config::CatalogConfig;
    use snapshop_core::domain::product::ProductRating;
    use snapshop_core::domain::user::User;

    use crate::auth::{register, AppState, AuthUser, RegisterRequest};

    use super::*;

    async fn seeded_state() -> (AppState, User) {
        let state = crate::auth::tests::state().await;
        let (_, Json(session)) = register(
            State(state.clone()),
            Json(RegisterRequest {
                name: "Ada Lovelace".to_string(),
                username: "ada_l".to_string(),
                email: "ada@example.com".to_string(),
                password: "correct-horse".to_string(),
                confirm_password: "correct-horse".to_string(),
                role: None,
                accepted_terms: true,
            }),
        )
        .await
        .expect("register");
        (state, session.user)
    }

    fn descriptor(title: &str, category: &str, price: i64) -> AddProductInput {
        AddProductInput {
            id: Some(1),
            title: title.to_string(),
            price: Decimal::from(price),
            description: "test".to_string(),
            category: category.to_string(),
            image: "https://img.test/1.jpg".to_string(),
            rating: ProductRating { rate: 4.0, count: 10 },
        }
    }

    #[tokio::test]
    async fn add_then_add_again_reports_increment() {
        let (state, user) = seeded_state().await;

        let Json(first) = add_product(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(descriptor("Backpack", "bags", 100)),
        )
        .await
        .expect("first add");
        assert_eq!(first.status, "success");
        assert_eq!(first.quantity, 1);
        assert!(first.message.contains("added to your collection"));

        let Json(second) = add_product(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(descriptor("Backpack", "bags", 100)),
        )
        .await
        .expect("second add");
        assert_eq!(second.quantity, 2);
        assert_eq!(second.product_id, first.product_id);
        assert!(second.message.contains("Increased quantity"));

        let Json(collection) =
            list_collection(State(state), AuthUser(user)).await.expect("list");
        assert_eq!(collection.products.len(), 1);
        assert_eq!(collection.products[0].quantity, 2);
    }

    #[tokio::test]
    async fn add_rejects_descriptor_without_title() {
        let (state, user) = seeded_state().await;

        let (code, Json(error)) =
            add_product(State(state), AuthUser(user), Json(descriptor("", "bags", 100)))
                .await
                .expect_err("missing title");

        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(error.status, "error");
        assert!(error.message.contains("title"));
    }

    #[tokio::test]
    async fn quantity_actions_walk_a_row_to_deletion() {
        let (state, user) = seeded_state().await;
        let Json(added) = add_product(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(descriptor("Backpack", "bags", 100)),
        )
        .await
        .expect("add");

        let Json(increased) = update_quantity(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(QuantityRequest { product_id: added.product_id, action: "increase".to_string() }),
        )
        .await
        .expect("increase");
        assert_eq!(increased.quantity, 2);

        let Json(decreased) = update_quantity(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(QuantityRequest { product_id: added.product_id, action: "decrease".to_string() }),
        )
        .await
        .expect("decrease");
        assert_eq!(decreased.quantity, 1);

        let Json(removed) = update_quantity(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(QuantityRequest { product_id: added.product_id, action: "decrease".to_string() }),
        )
        .await
        .expect("decrease to zero");
        assert_eq!(removed.quantity, 0);
        assert!(removed.message.contains("removed"));

        let Json(collection) =
            list_collection(State(state), AuthUser(user)).await.expect("list");
        assert!(collection.products.is_empty());
    }

    #[tokio::test]
    async fn unknown_action_is_a_bad_request() {
        let (state, user) = seeded_state().await;

        let (code, Json(error)) = update_quantity(
            State(state),
            AuthUser(user),
            Json(QuantityRequest { product_id: 1, action: "upsert".to_string() }),
        )
        .await
        .expect_err("bad action");

        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(error.message.contains("Unknown quantity action"));
    }

    #[tokio::test]
    async fn foreign_line_item_is_not_found() {
        let (state, ada) = seeded_state().await;
        let (_, Json(bob_session)) = register(
            State(state.clone()),
            Json(RegisterRequest {
                name: "Bob".to_string(),
                username: "bob_b".to_string(),
                email: "bob@example.com".to_string(),
                password: "correct-horse".to_string(),
                confirm_password: "correct-horse".to_string(),
                role: None,
                accepted_terms: true,
            }),
        )
        .await
        .expect("register bob");

        let Json(added) = add_product(
            State(state.clone()),
            AuthUser(ada),
            Json(descriptor("Backpack", "bags", 100)),
        )
        .await
        .expect("add as ada");

        let (code, Json(error)) = update_quantity(
            State(state),
            AuthUser(bob_session.user),
            Json(QuantityRequest { product_id: added.product_id, action: "increase".to_string() }),
        )
        .await
        .expect_err("cross-user access");

        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(error.message, "Product not found in your collection.");
    }

    #[tokio::test]
    async fn profile_reports_statistics_for_the_caller() {
        let (state, user) = seeded_state().await;
        add_product(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(descriptor("Backpack", "A", 10)),
        )
        .await
        .expect("add backpack");
        update_quantity(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(QuantityRequest { product_id: 1, action: "increase".to_string() }),
        )
        .await
        .expect("increase backpack");
        add_product(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(descriptor("Mug", "B", 5)),
        )
        .await
        .expect("add mug");

        let Json(profile) = get_profile(State(state), AuthUser(user)).await.expect("profile");

        assert_eq!(profile.statistics.total_line_items, 2);
        assert_eq!(profile.statistics.total_quantity, 3);
        assert_eq!(profile.statistics.total_value, Decimal::from(25));
        assert_eq!(profile.statistics.most_frequent_category.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn catalog_view_degrades_to_empty_list_on_upstream_failure() {
        let (state, user) = seeded_state().await;

        // The state's catalog client points at an unroutable address.
        let Json(response) = list_products(State(state), AuthUser(user)).await;
        assert!(response.products.is_empty());
        assert!(response.error.is_some());

        let body = serde_json::to_value(&response).expect("serialize");
        assert_eq!(body["error"], "Network error occurred");
    }

    #[tokio::test]
    async fn catalog_view_passes_products_through() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200).json_body(serde_json::json!([
                    {
                        "id": 1,
                        "title": "Backpack",
                        "price": 109.95,
                        "description": "",
                        "category": "bags",
                        "image": "",
                        "rating": {"rate": 3.9, "count": 120}
                    }
                ]));
            })
            .await;

        let (mut state, user) = seeded_state().await;
        state.catalog = CatalogClient::from_config(&CatalogConfig {
            base_url: server.base_url(),
            timeout_secs: 2,
        })
        .expect("catalog client");

        let Json(response) = list_products(State(state), AuthUser(user)).await;
        assert!(response.error.is_none());
        assert_eq!(response.products.len(), 1);
        assert_eq!(response.products[0].title, "Backpack");
    }
}
