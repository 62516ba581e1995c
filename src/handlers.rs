pub mod auth;
pub mod expenses;
pub mod health;
pub mod payment_methods;
pub mod tax_categories;
pub mod users;
