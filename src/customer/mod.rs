//! Customers and provisioning them with their first accounts.

mod core;
mod create;
mod customers_page;
mod delete_endpoint;
mod provision;

pub use core::{
    Customer, CustomerId, MAX_USERNAME_LENGTH, MEMBERSHIP_NUMBER_LENGTH, Username,
    create_user_table, delete_customer, get_all_customers, get_customer, insert_customer,
    validate_email, validate_full_name,
};
pub use create::{create_customer_endpoint, get_new_customer_page};
pub use customers_page::get_customers_page;
pub use delete_endpoint::delete_customer_endpoint;
pub use provision::{NewCustomer, ProvisionedCustomer, provision_customer};
