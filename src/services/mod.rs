mod api;
mod client;

#[cfg(test)]
pub mod fake;

pub use api::MarklyApi;
pub use client::ApiClient;
