//! Workflow (Mistral) service plumbing
//!
//! This module provides what every resource module needs to talk to the
//! workflow API: authentication, the HTTP transport and the service client.
//!
//! # Module Structure
//!
//! - [`auth`] - Token providers
//! - [`client`] - Service client: endpoint, URL building, request dispatch
//! - [`http`] - Transport trait and the reqwest implementation
//!
//! # Example
//!
//! ```no_run
//! use mistral_workbooks::mistral::{auth::StaticToken, client::ServiceClient};
//!
//! fn example() -> mistral_workbooks::Result<()> {
//!     let client = ServiceClient::connect("http://controller:8989/v2", StaticToken::from_env()?)?;
//!     let url = client.service_url(&["workbooks"])?;
//!     println!("{}", url);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
