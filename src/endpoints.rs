//! Route paths for pages and htmx endpoints.
//!
//! Paths with an ID parameter, e.g. '/accounts/{account_id}', are turned into
//! links with [format_endpoint].

/// The root route which redirects to the customers page.
pub const ROOT: &str = "/";
/// The page for listing customers and their accounts.
pub const CUSTOMERS_VIEW: &str = "/customers";
/// The page for provisioning a new customer.
pub const NEW_CUSTOMER_VIEW: &str = "/customers/new";
/// The page for a single account, its identifiers and its ledger.
pub const ACCOUNT_VIEW: &str = "/accounts/{account_id}";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to provision a customer.
pub const POST_CUSTOMER: &str = "/api/customers";
/// The route to delete a customer.
pub const DELETE_CUSTOMER: &str = "/api/customers/{customer_id}";
/// The route to credit or debit an account.
pub const ACCOUNT_FUNDS: &str = "/api/accounts/{account_id}/funds";
/// The route to change the status of an account.
pub const ACCOUNT_STATUS: &str = "/api/accounts/{account_id}/status";

/// Replace the `{..}` parameter in `endpoint_path` with `id`.
///
/// Only the first parameter is replaced. A path without a parameter is
/// returned as is, and an unclosed parameter runs to the end of the path.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some((prefix, rest)) = endpoint_path.split_once('{') else {
        return endpoint_path.to_owned();
    };

    let suffix = rest.split_once('}').map_or("", |(_, suffix)| suffix);

    format!("{prefix}{id}{suffix}")
}
