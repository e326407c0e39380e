//! Post, like and comment use cases, each publishing its broadcast event

mod service;

#[cfg(test)]
mod tests;

pub use service::PostService;
