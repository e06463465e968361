pub mod client;
pub mod contents;

pub use client::GitHubClient;
pub use contents::{ContentEntry, ContentsResponse, EntryType};
