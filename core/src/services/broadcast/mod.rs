//! In-process event hub fanning broadcast events out to live subscribers

mod hub;

#[cfg(test)]
mod tests;

pub use hub::{EventHub, PublishReport, SubscriberId, Subscription};
