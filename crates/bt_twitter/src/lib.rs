pub mod client;
pub mod ratelimit;
pub mod registry;
pub mod sequencer;

pub use client::HttpPostingApi;
pub use ratelimit::{AccountRateLimiter, RateLimiterConfig};
pub use registry::HttpProjectRegistry;
pub use sequencer::{PostSummary, PostingSequencer};
