//! The form for a new transaction and the live USDT conversion of its amount.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState,
    auth::UserID,
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_usdt,
        loading_spinner,
    },
    transaction::TransactionType,
    workspace::{Draft, Workspaces},
};

/// The element ID of the draft's USDT amount.
pub const DRAFT_USDT_ID: &str = "draft-usdt";

/// The state needed to update the draft.
#[derive(Debug, Clone)]
pub struct DraftState {
    pub workspaces: Workspaces,
}

impl FromRef<AppState> for DraftState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            workspaces: state.workspaces.clone(),
        }
    }
}

/// The fields of the new transaction form.
#[derive(Debug, Deserialize)]
pub struct DraftForm {
    pub transaction_type: TransactionType,
    /// Kept as text since the field may be empty or half typed.
    pub amount_fiat: String,
    /// Replaces the converted amount when the user typed one in.
    #[serde(default)]
    pub amount_usdt: String,
    #[serde(default)]
    pub description: String,
}

fn parse_amount(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

impl DraftForm {
    /// The fiat amount, if it is a finite number.
    pub fn parsed_amount(&self) -> Option<f64> {
        parse_amount(&self.amount_fiat)
    }

    /// The USDT amount typed in by the user, if it is a finite number.
    pub fn parsed_amount_usdt(&self) -> Option<f64> {
        parse_amount(&self.amount_usdt)
    }
}

/// Renders the draft's USDT amount: an input holding the converted amount,
/// which the user may overwrite, and the signed amount that will be saved.
pub fn draft_usdt(fiat: Fiat, draft: &Draft, swap_oob: bool) -> Markup {
    let draft_url = format_fiat_endpoint(endpoints::DRAFT, fiat);
    let amount = draft.amount_usdt.map(|amount| format!("{:.2}", amount.abs()));

    html! {
        div
            id=(DRAFT_USDT_ID)
            hx-swap-oob=[swap_oob.then_some("true")]
        {
            label for="amount-usdt" class=(FORM_LABEL_STYLE) { "Amount (USDT)" }
            input
                type="number"
                name="amount_usdt"
                id="amount-usdt"
                step="0.01"
                min="0"
                placeholder="0.00"
                value=[amount]
                hx-post=(draft_url)
                hx-trigger="change"
                hx-target={ "#" (DRAFT_USDT_ID) }
                hx-swap="outerHTML"
                hx-include="closest form"
                class=(FORM_TEXT_INPUT_STYLE)
            ;
            p class="mt-1 text-sm text-gray-600 dark:text-gray-300"
            {
                "USDT amount: "
                span class="font-semibold"
                {
                    @match draft.amount_usdt {
                        Some(amount) => { (format_usdt(draft.transaction_type.normalize(amount))) }
                        None => { "-" }
                    }
                }
            }
        }
    }
}

fn type_radio(transaction_type: TransactionType, checked: bool) -> Markup {
    let id = format!("type-{}", transaction_type.as_str());

    html! {
        div class="flex-1"
        {
            input
                type="radio"
                name="transaction_type"
                id=(id)
                value=(transaction_type.as_str())
                checked[checked]
                class={ "sr-only " (FORM_RADIO_INPUT_STYLE) }
            ;
            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (transaction_type.label()) }
        }
    }
}

/// Typing a fiat amount converts it again, so the USDT amount is left out.
const FIAT_INPUT_INCLUDE: &str =
    "#draft-form [name='transaction_type'], #draft-form [name='description']";

/// Renders the form for adding a transaction to the ledger for `fiat`.
///
/// `next_number` is used for the default description, e.g. "Transaction #3".
pub fn draft_form(fiat: Fiat, draft: &Draft, next_number: usize) -> Markup {
    let create_url = format_fiat_endpoint(endpoints::DASHBOARD_TRANSACTIONS, fiat);
    let draft_url = format_fiat_endpoint(endpoints::DRAFT, fiat);
    let amount = draft.amount_fiat.map(|amount| amount.to_string());

    html! {
        section class=(CARD_STYLE)
        {
            h2 class="mb-4 text-lg font-semibold" { "New transaction" }

            form
                id="draft-form"
                hx-post=(create_url)
                hx-target-error="#alert-container"
                hx-disabled-elt="#draft-submit"
                class="space-y-4"
            {
                fieldset class=(FORM_RADIO_GROUP_STYLE)
                {
                    legend class=(FORM_LABEL_STYLE) { "Type" }
                    (type_radio(TransactionType::Income, draft.transaction_type == TransactionType::Income))
                    (type_radio(TransactionType::Expense, draft.transaction_type == TransactionType::Expense))
                }

                div
                {
                    label for="amount-fiat" class=(FORM_LABEL_STYLE)
                    {
                        "Amount (" (fiat.code()) ")"
                    }
                    input
                        type="number"
                        name="amount_fiat"
                        id="amount-fiat"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        value=[amount]
                        required
                        hx-post=(draft_url)
                        hx-trigger="input changed delay:300ms"
                        hx-target={ "#" (DRAFT_USDT_ID) }
                        hx-swap="outerHTML"
                        hx-include=(FIAT_INPUT_INCLUDE)
                        class=(FORM_TEXT_INPUT_STYLE)
                    ;
                }

                (draft_usdt(fiat, draft, false))

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                    input
                        type="text"
                        name="description"
                        id="description"
                        value=(draft.description)
                        placeholder={ "Transaction #" (next_number) }
                        class=(FORM_TEXT_INPUT_STYLE)
                    ;
                }

                button type="submit" id="draft-submit" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" { (loading_spinner()) }
                    "Add transaction"
                }
            }
        }
    }
}

/// Store what the user has typed so far and convert the amount with the
/// dashboard's current rate. A USDT amount in the form is used as is.
///
/// Responds with the updated USDT amount.
pub async fn update_draft_endpoint(
    State(state): State<DraftState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<Fiat>,
    Form(form): Form<DraftForm>,
) -> Response {
    let amount = form.parsed_amount();
    let amount_usdt = form.parsed_amount_usdt();

    let draft = state.workspaces.update(user_id, fiat, |workspace| {
        workspace.set_draft(form.transaction_type, amount, &form.description);
        if let Some(amount_usdt) = amount_usdt {
            workspace.set_manual_usdt(amount_usdt);
        }
        workspace.draft.clone()
    });

    match draft {
        Ok(draft) => draft_usdt(fiat, &draft, false).into_response(),
        Err(error) => error.into_alert_response(),
    }
}
