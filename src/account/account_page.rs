//! The page for a single account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::macros::format_description;

use crate::{
    AppState, Error,
    account::{
        Account, AccountId, AccountStatus, LedgerEntry, get_account, get_ledger_entries,
    },
    customer::{Customer, get_customer},
    endpoints,
    html::{
        BADGE_ACTIVE_STYLE, BADGE_CLOSED_STYLE, BADGE_FROZEN_STYLE, BUTTON_PRIMARY_STYLE,
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_amount,
    },
    navigation::NavBar,
};

/// The state needed for the account page.
#[derive(Debug, Clone)]
pub struct AccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page with an account's identifiers, balance and ledger.
pub async fn get_account_page(
    Path(account_id): Path<AccountId>,
    State(state): State<AccountPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, &connection)?;
    let customer = get_customer(account.customer_id, &connection)?;
    let ledger = get_ledger_entries(account_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve ledger: {error}"))?;

    Ok(account_view(&account, &customer, &ledger).into_response())
}

/// A coloured badge with the account status.
pub fn status_badge(status: AccountStatus) -> Markup {
    let (style, text) = match status {
        AccountStatus::Active => (BADGE_ACTIVE_STYLE, "Active"),
        AccountStatus::Frozen => (BADGE_FROZEN_STYLE, "Frozen"),
        AccountStatus::Closed => (BADGE_CLOSED_STYLE, "Closed"),
    };

    html!( span class=(style) { (text) } )
}

fn account_view(account: &Account, customer: &Customer, ledger: &[LedgerEntry]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNT_VIEW).into_html();
    let title = format!("{} {}", account.kind.label(), account.account_number);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6"
            {
                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (title) }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (customer.full_name) " (" (customer.username) ")"
                        }
                    }

                    a href=(endpoints::CUSTOMERS_VIEW) class=(LINK_STYLE)
                    {
                        "Back to customers"
                    }
                }

                (identifiers_view(account))

                @if account.status == AccountStatus::Active {
                    (funds_form_view(account.id))
                }

                @if account.status != AccountStatus::Closed {
                    (status_form_view(account))
                }

                (ledger_view(account, ledger))
            }
        }
    );

    base(&title, &content)
}

fn identifiers_view(account: &Account) -> Markup {
    html!(
        dl
            class="grid grid-cols-1 sm:grid-cols-2 gap-4 rounded border
                border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700
                dark:bg-gray-800"
            data-account-identifiers="true"
        {
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                dd class="text-2xl font-semibold tabular-nums"
                {
                    (format_amount(account.balance, account.currency))
                }
            }
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "Status" }
                dd { (status_badge(account.status)) }
            }
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "Account Number" }
                dd class="font-mono" { (account.account_number) }
            }
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "IBAN" }
                dd class="font-mono" { (account.iban) }
            }
            @if let Some(sort_code) = &account.sort_code {
                div
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Sort Code" }
                    dd class="font-mono" { (format_sort_code(sort_code)) }
                }
            }
            @if let Some(routing_number) = &account.routing_number {
                div
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Routing Number" }
                    dd class="font-mono" { (routing_number) }
                }
            }
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "BIC" }
                dd class="font-mono" { (account.bic) }
            }
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { "Opened" }
                dd { (account.opened_on) }
            }
        }
    )
}

/// Format a 6 digit sort code as `12-34-56`.
fn format_sort_code(sort_code: &str) -> String {
    if sort_code.len() != 6 || !sort_code.is_ascii() {
        return sort_code.to_owned();
    }

    format!(
        "{}-{}-{}",
        &sort_code[0..2],
        &sort_code[2..4],
        &sort_code[4..6]
    )
}

fn funds_form_view(account_id: AccountId) -> Markup {
    let funds_endpoint = endpoints::format_endpoint(endpoints::ACCOUNT_FUNDS, account_id);

    html!(
        form
            hx-post=(funds_endpoint)
            hx-target-error="#alert-container"
            class="space-y-4"
            data-form="funds"
        {
            h2 class="text-lg font-semibold" { "Move Funds" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        id="direction-credit"
                        type="radio"
                        name="direction"
                        value="credit"
                        checked
                        required
                        class=(FORM_RADIO_INPUT_STYLE);
                    label for="direction-credit" class=(FORM_RADIO_LABEL_STYLE) { "Credit" }
                }
                div class="flex items-center gap-3"
                {
                    input
                        id="direction-debit"
                        type="radio"
                        name="direction"
                        value="debit"
                        required
                        class=(FORM_RADIO_INPUT_STYLE);
                    label for="direction-debit" class=(FORM_RADIO_LABEL_STYLE) { "Debit" }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Cash deposit"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
        }
    )
}

fn status_form_view(account: &Account) -> Markup {
    let status_endpoint = endpoints::format_endpoint(endpoints::ACCOUNT_STATUS, account.id);

    html!(
        form
            hx-post=(status_endpoint)
            hx-target-error="#alert-container"
            class="space-y-4"
            data-form="status"
        {
            h2 class="text-lg font-semibold" { "Change Status" }

            div
            {
                label for="status" class=(FORM_LABEL_STYLE) { "Status" }

                select id="status" name="status" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for status in AccountStatus::ALL {
                        option value=(status.as_str()) selected[status == account.status]
                        {
                            (status.as_str())
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Update Status" }
        }
    )
}

fn ledger_view(account: &Account, ledger: &[LedgerEntry]) -> Markup {
    let timestamp_format = format_description!("[year]-[month]-[day] [hour]:[minute]");

    html!(
        section class="space-y-2"
        {
            h2 class="text-lg font-semibold" { "Ledger" }

            table class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Recorded" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class="px-6 py-4 text-right" { "Amount" }
                        th scope="col" class="px-6 py-4 text-right" { "Balance" }
                    }
                }

                tbody
                {
                    @for entry in ledger {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                (entry.recorded_at.format(&timestamp_format).unwrap_or_default())
                            }
                            td class=(TABLE_CELL_STYLE) { (entry.description) }
                            td class="px-6 py-4 text-right tabular-nums"
                            {
                                (format_amount(entry.amount, account.currency))
                            }
                            td class="px-6 py-4 text-right tabular-nums"
                            {
                                (format_amount(entry.balance_after, account.currency))
                            }
                        }
                    }

                    @if ledger.is_empty() {
                        tr
                        {
                            td
                                colspan="4"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No funds have been moved yet."
                            }
                        }
                    }
                }
            }
        }
    )
}
