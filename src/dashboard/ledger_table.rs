//! The table of transactions in a ledger.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    fiat::Fiat,
    html::{
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, amount_style,
        edit_delete_action_links, format_fiat, format_usdt,
    },
    transaction::Transaction,
};

/// Renders `transactions` in insertion order.
///
/// With `editable` each row gets links for editing and deleting it.
pub fn ledger_table(transactions: &[Transaction], fiat: Fiat, editable: bool) -> Markup {
    html! {
        div class="relative w-full overflow-x-auto rounded shadow-md"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount (" (fiat.code()) ")" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount (USDT)" }
                        @if editable {
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (ledger_row(transaction, editable))
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td
                                colspan=(if editable { 6 } else { 5 })
                                class={ (TABLE_CELL_STYLE) " text-center" }
                            {
                                "No transactions yet."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn ledger_row(transaction: &Transaction, editable: bool) -> Markup {
    html! {
        tr id={ "transaction-" (transaction.id) } class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE) { (transaction.transaction_type.label()) }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style(transaction.amount_fiat)) }
            {
                (format_fiat(transaction.amount_fiat, transaction.fiat))
            }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style(transaction.amount_usdt)) }
            {
                (format_usdt(transaction.amount_usdt))
            }
            @if editable {
                td class={ (TABLE_CELL_STYLE) " flex gap-4" }
                {
                    (edit_delete_action_links(
                        &format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
                        &format_endpoint(endpoints::TRANSACTION, transaction.id),
                        &format!("Delete \"{}\"?", transaction.description),
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        endpoints::{self, format_endpoint},
        fiat::Fiat,
        test_utils::select_text,
        transaction::{Transaction, TransactionType},
    };

    use super::ledger_table;

    fn transaction(id: i64, description: &str) -> Transaction {
        Transaction {
            id,
            user_id: UserID::new(1),
            fiat: Fiat::Ves,
            transaction_type: TransactionType::Expense,
            description: description.to_owned(),
            amount_fiat: -100.0,
            amount_usdt: -0.56,
            date: date!(2025 - 10 - 05),
        }
    }

    #[test]
    fn rows_are_in_given_order_with_actions() {
        let transactions = [transaction(2, "Groceries"), transaction(1, "Bus")];

        let html = Html::parse_fragment(&ledger_table(&transactions, Fiat::Ves, true).into_string());

        let descriptions = select_text(&html, "tbody tr td:nth-child(2)");
        assert_eq!(descriptions, ["Groceries", "Bus"]);

        let delete_button = html
            .select(&Selector::parse("#transaction-2 button[hx-delete]").unwrap())
            .next()
            .expect("no delete button");
        assert_eq!(
            delete_button.value().attr("hx-delete"),
            Some(format_endpoint(endpoints::TRANSACTION, 2).as_str())
        );

        let amount: String = html
            .select(&Selector::parse("#transaction-2 td:nth-child(4)").unwrap())
            .next()
            .unwrap()
            .text()
            .collect();
        assert_eq!(amount.trim(), "Bs -100.00");
    }

    #[test]
    fn read_only_table_has_no_actions() {
        let html = Html::parse_fragment(
            &ledger_table(&[transaction(1, "Bus")], Fiat::Ves, false).into_string(),
        );

        assert!(
            html.select(&Selector::parse("button").unwrap())
                .next()
                .is_none()
        );
    }

    #[test]
    fn empty_ledger_shows_message() {
        let html = Html::parse_fragment(&ledger_table(&[], Fiat::Cop, true).into_string());

        let text: String = html.root_element().text().collect();
        assert!(text.contains("No transactions yet."));
    }
}
