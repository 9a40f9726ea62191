//! `ssadmin` is a library for calling the administration API of X-Road
//! security servers.
//!
//! Every call goes through a [`ratelimit::RateGovernor`] which keeps each
//! remote host below its per-second and per-minute call ceilings. Failed
//! calls come back as a [`diagnostics::EnrichedFailure`] carrying the
//! request and the controller that started it.
//!
//! ```no_run
//! use http::Method;
//! use ssadmin_lib::diagnostics::{CallDescriptor, CallStack};
//! use ssadmin_lib::{ApiClientBuilder, Result, frame};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ApiClientBuilder::builder()
//!         .base_url(Url::parse("https://ss3:4000").unwrap())
//!         .build()
//!         .client()?;
//!
//!     let stack = CallStack::new().enter(frame!(controller "list_clients"));
//!     let call = CallDescriptor::new(Method::GET, "/clients").query_param("show_members", "false");
//!     if let Err(failure) = client.call(call, stack.frames(), None).await {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```
// #![deny(missing_docs)]

mod client;
mod types;

pub mod diagnostics;
pub mod ratelimit;

pub use client::{
    ApiClient, ApiClientBuilder, DEFAULT_API_BASE_PATH, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use types::*;
