mod cache;
mod expiration;

pub use cache::TokenCache;
