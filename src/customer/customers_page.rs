//! Customers listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_accounts_for_customer, status_badge},
    customer::{Customer, get_all_customers},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_amount,
    },
    navigation::NavBar,
};

/// The state needed for the customers listing page.
#[derive(Debug, Clone)]
pub struct CustomersPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CustomersPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct CustomerWithAccounts {
    customer: Customer,
    accounts: Vec<Account>,
}

/// Render the customers listing page with each customer's accounts.
pub async fn get_customers_page(State(state): State<CustomersPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let customers = get_all_customers(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve customers: {error}"))?;

    let customers = customers
        .into_iter()
        .map(|customer| {
            get_accounts_for_customer(customer.id, &connection)
                .map(|accounts| CustomerWithAccounts { customer, accounts })
        })
        .collect::<Result<Vec<_>, Error>>()
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(customers_view(&customers).into_response())
}

fn customers_view(customers: &[CustomerWithAccounts]) -> Markup {
    let new_customer_route = endpoints::NEW_CUSTOMER_VIEW;
    let nav_bar = NavBar::new(endpoints::CUSTOMERS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Customers" }

                    a href=(new_customer_route) class=(LINK_STYLE)
                    {
                        "New Customer"
                    }
                }

                @for entry in customers {
                    (customer_card(entry))
                }

                @if customers.is_empty() {
                    p class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                    {
                        "No customers yet. "
                        a href=(new_customer_route) class=(LINK_STYLE)
                        {
                            "Provision the first customer"
                        }
                    }
                }
            }
        }
    );

    base("Customers", &content)
}

fn customer_card(entry: &CustomerWithAccounts) -> Markup {
    let customer = &entry.customer;
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_CUSTOMER, customer.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? This will delete {} account(s) and their ledgers.",
        customer.username,
        entry.accounts.len()
    );

    html!(
        article
            class="rounded border border-gray-200 bg-white shadow-sm
                dark:border-gray-700 dark:bg-gray-800"
            data-customer-card="true"
        {
            header class="flex items-start justify-between gap-3 px-4 py-3"
            {
                div
                {
                    h2 class="text-lg font-semibold" { (customer.full_name) }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (customer.username) " · " (customer.email)
                    }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Membership number " (customer.membership_number)
                    }
                }

                button
                    hx-delete=(delete_url)
                    hx-confirm=(confirm_message)
                    hx-target="closest [data-customer-card='true']"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }

            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left rtl:text-right
                    text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "IBAN" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Bank Code" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            th scope="col" class="px-6 py-4 text-right" { "Balance" }
                        }
                    }

                    tbody
                    {
                        @for account in &entry.accounts {
                            (account_row(account))
                        }
                    }
                }
            }
        }
    )
}

fn account_row(account: &Account) -> Markup {
    let account_url = endpoints::format_endpoint(endpoints::ACCOUNT_VIEW, account.id);
    let bank_code = account
        .sort_code
        .as_deref()
        .or(account.routing_number.as_deref())
        .unwrap_or(&account.bic);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                a href=(account_url) class=(LINK_STYLE)
                {
                    (account.kind.label()) " " (account.account_number)
                }
            }
            td class="px-6 py-4 font-mono" { (account.iban) }
            td class="px-6 py-4 font-mono" { (bank_code) }
            td class=(TABLE_CELL_STYLE) { (status_badge(account.status)) }
            td class="px-6 py-4 text-right tabular-nums"
            {
                (format_amount(account.balance, account.currency))
            }
        }
    )
}
