//! Collaborator-call wrappers
//!
//! The review core consumes three external services as black boxes: text
//! splitting, candidate search, and styled formatting. Each is a trait so
//! the core and its tests never depend on the HTTP transport directly.

mod http;
mod types;

pub use http::HttpCollaborator;
pub use types::{
    ClientError, FormatService, SearchOutcome, SearchService, SplitService,
};
#[allow(unused_imports)]
pub use types::{FormatRequest, FormatResponse, SearchRequest, SearchResponse, SplitRequest, SplitResponse};
