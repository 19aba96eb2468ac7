//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}/edit',
//! use [format_endpoint]. Endpoints scoped to a currency contain `{fiat}`,
//! which is filled in by [format_fiat_endpoint].

use crate::fiat::Fiat;

/// The root route which redirects to the default dashboard.
pub const ROOT: &str = "/";
/// The dashboard for one currency.
pub const DASHBOARD_VIEW: &str = "/dashboard/{fiat}";
/// The dashboard users land on after logging in.
pub const DEFAULT_DASHBOARD: &str = "/dashboard/ves";
/// The page listing the consolidated periods for one currency.
pub const BALANCES_VIEW: &str = "/dashboard/{fiat}/balances";
/// The page for editing a transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting the user's password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The JSON endpoint reporting the marketplace price, `?fiat=VES`.
pub const RATE_API: &str = "/api/rate";
/// The route that fetches a new rate for a dashboard, or sets one typed in
/// by the user.
pub const REFRESH_RATE: &str = "/api/dashboard/{fiat}/rate";
/// The route that recomputes the USDT amount of the draft transaction.
pub const DRAFT: &str = "/api/dashboard/{fiat}/draft";
/// The route to add a transaction to a ledger.
pub const DASHBOARD_TRANSACTIONS: &str = "/api/dashboard/{fiat}/transactions";
/// The route that turns a ledger into a period.
pub const CONSOLIDATE: &str = "/api/dashboard/{fiat}/consolidate";
/// The route to delete a period.
pub const PERIOD: &str = "/api/dashboard/{fiat}/periods/{period_id}";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// Only the first parameter is replaced, so fill in `{fiat}` with
/// [format_fiat_endpoint] first.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Replace `{fiat}` in `endpoint_path` with the URL slug for `fiat`.
pub fn format_fiat_endpoint(endpoint_path: &str, fiat: Fiat) -> String {
    endpoint_path.replace("{fiat}", fiat.slug())
}
