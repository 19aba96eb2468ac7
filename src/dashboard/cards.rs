//! Summary cards for the totals of a ledger.

use maud::{Markup, html};

use crate::{
    fiat::Fiat,
    html::{CARD_STYLE, amount_style, format_fiat, format_usdt},
    ledger::LedgerTotals,
};

/// The element ID of the dashboard's summary cards.
pub const SUMMARY_CARDS_ID: &str = "summary-cards";

/// Renders the total fiat, total USDT and commission cards.
///
/// With `swap_oob` the cards replace the element with `id` from any htmx
/// response, e.g. after a transaction is deleted.
pub fn summary_cards(id: &str, totals: &LedgerTotals, fiat: Fiat, swap_oob: bool) -> Markup {
    html! {
        section
            id=(id)
            hx-swap-oob=[swap_oob.then_some("true")]
            class="grid w-full grid-cols-1 gap-4 mb-6 sm:grid-cols-3"
        {
            (card(&format!("Total {}", fiat.code()), &format_fiat(totals.total_fiat, fiat), totals.total_fiat))
            (card("Total USDT", &format_usdt(totals.total_usdt), totals.total_usdt))
            (card("Commission (14%)", &format_usdt(totals.commission), totals.commission))
        }
    }
}

fn card(title: &str, value: &str, amount: f64) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h3 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class={ "mt-1 text-2xl font-bold " (amount_style(amount)) } { (value) }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{fiat::Fiat, ledger::LedgerTotals, test_utils::select_text};

    use super::{SUMMARY_CARDS_ID, summary_cards};

    #[test]
    fn shows_each_total() {
        let totals = LedgerTotals {
            total_fiat: 80120.0,
            total_usdt: 20.0,
            commission: 2.8,
        };

        let html = Html::parse_fragment(
            &summary_cards(SUMMARY_CARDS_ID, &totals, Fiat::Cop, false).into_string(),
        );

        let values = select_text(&html, "p");
        assert_eq!(values, ["COP 80,120.00", "20.00 USDT", "2.80 USDT"]);
        let section = html
            .select(&Selector::parse("section#summary-cards").unwrap())
            .next()
            .unwrap();
        assert_eq!(section.value().attr("hx-swap-oob"), None);
    }

    #[test]
    fn can_be_swapped_out_of_band() {
        let html = Html::parse_fragment(
            &summary_cards(SUMMARY_CARDS_ID, &LedgerTotals::default(), Fiat::Ves, true)
                .into_string(),
        );

        let section = html
            .select(&Selector::parse("section#summary-cards").unwrap())
            .next()
            .unwrap();
        assert_eq!(section.value().attr("hx-swap-oob"), Some("true"));
    }
}
