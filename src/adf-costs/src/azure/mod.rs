mod auth;
mod client;
pub mod error;
pub mod types;

pub use auth::{TokenProvider, TokenSource};
pub use client::{DataFactoryClient, FactoryApi};
pub use error::{AuthError, FetchError, RecordShapeError};
pub use types::{BearerToken, InvalidWindow, PipelineRun, QueryPage, RunFilter, TimeWindow};

#[cfg(test)]
pub use auth::MockTokenSource;
