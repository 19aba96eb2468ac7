//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, redirect_if_logged_in, register_user,
    },
    dashboard::{
        get_dashboard_page, refresh_rate_endpoint, set_manual_rate_endpoint, update_draft_endpoint,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    period::{consolidate_endpoint, delete_period_endpoint, get_balances_page},
    rate::get_rate_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_edit_transaction_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    // Logged in users have no reason to see these pages.
    let log_in_pages = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            redirect_if_logged_in,
        ));

    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::RATE_API, get(get_rate_endpoint))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .merge(log_in_pages);

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::BALANCES_VIEW, get(get_balances_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::REFRESH_RATE,
                post(refresh_rate_endpoint).put(set_manual_rate_endpoint),
            )
            .route(endpoints::DRAFT, post(update_draft_endpoint))
            .route(
                endpoints::DASHBOARD_TRANSACTIONS,
                post(create_transaction_endpoint),
            )
            .route(endpoints::CONSOLIDATE, post(consolidate_endpoint))
            .route(endpoints::PERIOD, delete(delete_period_endpoint))
            .route(
                endpoints::TRANSACTION,
                put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the default dashboard.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DEFAULT_DASHBOARD)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints, rate::P2PClient};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Etc/UTC",
            P2PClient::new(
                "http://127.0.0.1:9/search",
                "http://127.0.0.1:9/ticker",
                "http://127.0.0.1:9/latest",
            ),
            None,
        )
        .unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn dashboard_redirects_to_log_in_when_logged_out() {
        let server = get_test_server();

        let response = server.get(endpoints::DEFAULT_DASHBOARD).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        assert!(
            location
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW),
            "got redirect to {location:?}"
        );
    }

    #[tokio::test]
    async fn api_routes_use_htmx_redirect_when_logged_out() {
        let server = get_test_server();

        let response = server.post("/api/dashboard/ves/consolidate").await;

        response.assert_status_ok();
        assert!(
            response
                .header("hx-redirect")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/does/not/exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
