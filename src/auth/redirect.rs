//! Where to send a user after they log in.
//!
//! Guarded routes pass the page the user was on to the log-in page as the
//! `redirect_url` query parameter. Only local pages are accepted so the
//! parameter cannot be used to send users to another site.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Pages that are pointless to land on right after logging in.
const AUTH_PAGES: [&str; 3] = [
    endpoints::LOG_IN_VIEW,
    endpoints::REGISTER_VIEW,
    endpoints::FORGOT_PASSWORD_VIEW,
];

/// The path and query of `raw_url` if it is a local page worth returning to.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    local_page(&uri)
}

fn local_page(uri: &Uri) -> Option<String> {
    let path_and_query = uri.path_and_query()?.as_str();
    let path = uri.path();

    let is_page = path.starts_with('/')
        && !path_and_query.starts_with("//")
        && !path.starts_with("/api/")
        && !AUTH_PAGES.contains(&path);

    is_page.then(|| path_and_query.to_owned())
}

/// The log-in URL that brings the user back to where `request` came from.
///
/// Page requests return to the requested page. htmx requests to `/api` return
/// to the page in the `HX-Current-URL` header. Anything else returns to the
/// default dashboard.
pub fn log_in_url_for(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        page_from_htmx_headers(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let target = target.unwrap_or_else(|| {
        tracing::warn!(
            "No page to return to after logging in from {}, using the dashboard.",
            request.uri().path()
        );
        endpoints::DEFAULT_DASHBOARD.to_owned()
    });

    match serde_urlencoded::to_string([("redirect_url", &target)]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

fn page_from_htmx_headers(request: &Request) -> Option<String> {
    let headers = request.headers();

    let is_htmx = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));
    if !is_htmx {
        return None;
    }

    // htmx sends the full URL, including the host.
    let current_url = headers.get("hx-current-url")?.to_str().ok()?;
    local_page(&current_url.parse::<Uri>().ok()?)
}
