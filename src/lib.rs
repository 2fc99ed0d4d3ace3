//! Invoice intake: extract text from uploaded invoices and structure it with
//! a hosted language model.

pub mod cli;
pub mod config;
pub mod extract;
pub mod invoice;
pub mod llm;
pub mod server;

#[cfg(test)]
mod test_support;
