pub mod client;
pub mod fetcher;
pub mod model;
pub mod normalizer;

pub use client::{Endpoints, OvoClient};
