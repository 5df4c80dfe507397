//! Customer provisioning page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::AccountKind,
    allocator::ThreadRandom,
    config::InstitutionConfig,
    currency::Currency,
    customer::{MAX_USERNAME_LENGTH, NewCustomer, provision_customer},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
};

/// The state needed for provisioning a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub institutions: Arc<InstitutionConfig>,
}

impl FromRef<AppState> for CreateCustomerEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            institutions: state.institutions.clone(),
        }
    }
}

/// Form data for provisioning a customer.
///
/// The checkboxes are only sent when they are ticked.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerFormData {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub currency: String,
    #[serde(default)]
    pub open_checking: Option<String>,
    #[serde(default)]
    pub open_savings: Option<String>,
}

impl CustomerFormData {
    fn account_kinds(&self) -> Vec<AccountKind> {
        let mut kinds = Vec::new();

        if self.open_checking.is_some() {
            kinds.push(AccountKind::Checking);
        }

        if self.open_savings.is_some() {
            kinds.push(AccountKind::Savings);
        }

        kinds
    }

    fn validate(&self) -> Result<NewCustomer, Error> {
        let currency = self.currency.parse::<Currency>()?;

        NewCustomer::new(
            &self.username,
            &self.full_name,
            &self.email,
            currency,
            self.account_kinds(),
        )
    }
}

/// Render the customer provisioning page.
pub async fn get_new_customer_page() -> Response {
    new_customer_view().into_response()
}

/// Handle the provisioning form submission.
///
/// Invalid input re-renders the form with an error message. Any failure after
/// validation discards the whole submission and shows an alert.
pub async fn create_customer_endpoint(
    State(state): State<CreateCustomerEndpointState>,
    Form(form): Form<CustomerFormData>,
) -> Response {
    let new_customer = match form.validate() {
        Ok(new_customer) => new_customer,
        Err(error) => {
            return new_customer_form_view(&format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match provision_customer(
        &new_customer,
        &state.institutions,
        ThreadRandom,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::CUSTOMERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::DuplicateUsername(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "Could not provision customer {}: {error}",
                new_customer.username
            );

            error.into_alert_response()
        }
    }
}

fn new_customer_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CUSTOMER_VIEW).into_html();
    let form = new_customer_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-6 text-xl font-bold" { "New Customer" }
            (form)
        }
    };

    base("New Customer", &content)
}

fn new_customer_form_view(error_message: &str) -> Markup {
    let create_customer_endpoint = endpoints::POST_CUSTOMER;

    html! {
        form
            hx-post=(create_customer_endpoint)
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            hx-disabled-elt="find button"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    id="username"
                    type="text"
                    name="username"
                    placeholder="alice.smith"
                    maxlength=(MAX_USERNAME_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="full_name" class=(FORM_LABEL_STYLE) { "Full Name" }

                input
                    id="full_name"
                    type="text"
                    name="full_name"
                    placeholder="Alice Smith"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    id="email"
                    type="email"
                    name="email"
                    placeholder="alice@example.com"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Currency" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (index, currency) in Currency::ALL.iter().enumerate() {
                        @let id = format!("currency-{}", currency.as_str().to_lowercase());
                        div class="flex items-center gap-3"
                        {
                            input
                                id=(id)
                                type="radio"
                                name="currency"
                                value=(currency.as_str())
                                checked[index == 0]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                            {
                                (currency.as_str()) " (" (currency.symbol()) ")"
                            }
                        }
                    }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Accounts" }

                div class="flex flex-col gap-2"
                {
                    label class="flex items-center gap-2"
                    {
                        input type="checkbox" name="open_checking" checked;
                        "Checking"
                    }

                    label class="flex items-center gap-2"
                    {
                        input type="checkbox" name="open_savings";
                        "Savings"
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                "Provision Customer"
            }
        }
    }
}

#[cfg(test)]
mod new_customer_page_tests {
    use axum::http::StatusCode;

    use crate::{
        customer::get_new_customer_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_radio_values, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_customer_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .expect("content-type header missing"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CUSTOMER, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "full_name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "currency", "radio");
        assert_form_radio_values(&form, "currency", &["GBP", "EUR", "USD"]);
        assert_form_submit_button(&form);
    }
}
