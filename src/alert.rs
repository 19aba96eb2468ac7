//! Alert messages shown after htmx requests.
//!
//! Alerts replace the `#alert-container` element that [base](crate::html::base)
//! places at the bottom of every page with an out-of-band swap, so a handler can
//! return an alert alongside whatever else it renders.

use axum::response::Html;
use maud::{Markup, html};

const ALERT_CONTAINER_STYLE: &str = "position: fixed; bottom: 1rem; left: 50%; \
    transform: translateX(-50%); z-index: 9999;";

/// A message for the user about the result of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// The action failed.
    Error {
        /// What went wrong.
        message: String,
        /// How the user might fix it.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band swap for `#alert-container`.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    /// Render the alert as markup so it can be combined with other fragments.
    pub fn into_markup(self) -> Markup {
        let (message, details, colours, title) = match self {
            Alert::SuccessSimple { message } => (
                message,
                None,
                "text-green-800 bg-green-50 border-green-300 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                "Success",
            ),
            Alert::Error { message, details } => (
                message,
                Some(details),
                "text-red-800 bg-red-50 border-red-300 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                "Error",
            ),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style=(ALERT_CONTAINER_STYLE)
            {
                div
                    role="alert"
                    aria-label=(title)
                    class={ "flex items-start gap-3 p-4 border rounded-lg shadow " (colours) }
                {
                    div class="flex-1"
                    {
                        p class="text-sm font-medium" { (message) }

                        @if let Some(details) = details {
                            @if !details.is_empty() {
                                p class="mt-1 text-sm" { (details) }
                            }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-lg leading-none opacity-70 hover:opacity-100"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "×"
                    }
                }
            }
        }
    }
}
