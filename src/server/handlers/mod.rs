//! HTTP request handlers.

mod health;
mod invoice;

pub use health::{health, root};
pub use invoice::process_invoice;
