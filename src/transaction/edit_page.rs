use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    endpoints::{self, format_endpoint, format_fiat_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    transaction::{Transaction, get_transaction},
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The database connection for reading the transaction.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn amount_input(name: &str, label: &str, value: f64) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }
            input
                type="number"
                name=(name)
                id=(name)
                step="0.01"
                value=(value)
                required
                class=(FORM_TEXT_INPUT_STYLE)
            ;
        }
    }
}

fn edit_transaction_view(transaction: &Transaction) -> Markup {
    let dashboard_url = format_fiat_endpoint(endpoints::DASHBOARD_VIEW, transaction.fiat);
    let nav_bar = NavBar::new(&dashboard_url).into_html();
    let update_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold text-gray-900 dark:text-white"
                {
                    "Edit " (transaction.transaction_type.label()) " transaction"
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Amounts keep the sign of the transaction type, so an expense "
                    "entered as 100 is saved as -100."
                }

                form
                    hx-put=(update_url)
                    hx-target-error="#alert-container"
                    hx-disabled-elt="#edit-submit"
                    class="space-y-4"
                {
                    div
                    {
                        label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                        input
                            type="date"
                            name="date"
                            id="date"
                            value=(transaction.date)
                            required
                            class=(FORM_TEXT_INPUT_STYLE)
                        ;
                    }

                    div
                    {
                        label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                        input
                            type="text"
                            name="description"
                            id="description"
                            value=(transaction.description)
                            required
                            class=(FORM_TEXT_INPUT_STYLE)
                        ;
                    }

                    (amount_input(
                        "amount_fiat",
                        &format!("Amount ({})", transaction.fiat.code()),
                        transaction.amount_fiat,
                    ))
                    (amount_input("amount_usdt", "Amount (USDT)", transaction.amount_usdt))

                    button type="submit" id="edit-submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="inline htmx-indicator" { (loading_spinner()) }
                        "Save changes"
                    }
                }

                a href=(dashboard_url) class=(LINK_STYLE) { "Back to dashboard" }
            }
        }
    }
}

/// Renders the page for editing a transaction owned by the logged in user.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let transaction = match state.db_connection.lock() {
        Ok(connection) => get_transaction(transaction_id, user_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match transaction {
        Ok(transaction) => {
            base("Edit Transaction", &edit_transaction_view(&transaction)).into_response()
        }
        Err(error) => {
            if error != Error::NotFound {
                tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
            }
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::Html;
    use time::macros::date;

    use crate::{
        auth::UserID,
        db::initialize,
        endpoints::{self, format_endpoint},
        fiat::Fiat,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    fn get_test_server(user_id: i64) -> (TestServer, Transaction) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let transaction = create_transaction(
            Transaction::build(
                UserID::new(1),
                Fiat::Ves,
                TransactionType::Expense,
                100.0,
                0.56,
                date!(2025 - 10 - 05),
            )
            .description("Bus"),
            &connection,
        )
        .unwrap();

        let app = Router::new()
            .route(endpoints::EDIT_TRANSACTION_VIEW, get(get_edit_transaction_page))
            .layer(Extension(UserID::new(user_id)))
            .with_state(EditTransactionPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            });

        (
            TestServer::try_new(app).expect("Could not create test server."),
            transaction,
        )
    }

    #[tokio::test]
    async fn form_is_filled_with_transaction() {
        let (server, transaction) = get_test_server(1);

        let response = server
            .get(&format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
            .await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "date", "date", "2025-10-05");
        assert_form_input_with_value(&form, "description", "text", "Bus");
        assert_form_input_with_value(&form, "amount_fiat", "number", "-100");
        assert_form_input_with_value(&form, "amount_usdt", "number", "-0.56");
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let (server, transaction) = get_test_server(2);

        let response = server
            .get(&format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
