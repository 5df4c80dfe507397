//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{account_funds_endpoint, account_status_endpoint, get_account_page},
    customer::{
        create_customer_endpoint, delete_customer_endpoint, get_customers_page,
        get_new_customer_page,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::CUSTOMERS_VIEW, get(get_customers_page))
        .route(endpoints::NEW_CUSTOMER_VIEW, get(get_new_customer_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // These routes are called by HTMX and respond with alerts or the HX-REDIRECT header.
    let api_routes = Router::new()
        .route(endpoints::POST_CUSTOMER, post(create_customer_endpoint))
        .route(endpoints::DELETE_CUSTOMER, delete(delete_customer_endpoint))
        .route(endpoints::ACCOUNT_FUNDS, post(account_funds_endpoint))
        .route(endpoints::ACCOUNT_STATUS, post(account_status_endpoint));

    view_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the customers page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::CUSTOMERS_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_customers() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::CUSTOMERS_VIEW);
    }
}
