//! The page shown to users who cannot remember their password.
use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{endpoints, html::{LINK_STYLE, base}};

fn forgot_password_template() -> Markup {
    let content = html! {
        div
            class="flex flex-col items-center justify-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            div
                class="w-full bg-white rounded shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1
                        class="text-xl font-bold md:text-2xl"
                    {
                        "Forgot your password?"
                    }

                    p class="text-justify"
                    {
                        "Passwords can only be reset by whoever runs this server. \
                        Ask them to run the "
                        code { "reset_password" }
                        " program next to the server, pointing it at the database \
                        file and your email address:"
                    }

                    pre class="p-2 overflow-x-auto text-sm bg-gray-100 rounded dark:bg-gray-700"
                    {
                        "reset_password --db-path balance.db --email you@example.com"
                    }

                    p
                    {
                        a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE)
                        {
                            "Back to log in"
                        }
                    }
                }
            }
        }
    };

    base("Forgot Password", &content)
}

/// Renders a page describing how the user's password can be reset.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_template().into_response()
}

#[cfg(test)]
mod tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::get_forgot_password_page;

    #[tokio::test]
    async fn page_explains_reset_password_program() {
        let response = get_forgot_password_page().await;

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("reset_password --db-path"));

        let log_in_link = document
            .select(&Selector::parse("a[href]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .find(|href| *href == endpoints::LOG_IN_VIEW);
        assert!(log_in_link.is_some());
    }
}
