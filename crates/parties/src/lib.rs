//! Parties domain module: the stores (tenants) and their customers.

pub mod party;

pub use party::{Customer, StoreProfile};
