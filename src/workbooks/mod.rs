//! Workbooks resource of the workflow API
//!
//! A workbook bundles workflows and actions written in the Mistral v2 DSL.
//! The definition is opaque to this crate: it is uploaded as text and handed
//! back exactly as the service stored it.
//!
//! # Example
//!
//! ```no_run
//! use mistral_workbooks::workbooks::{self, CreateOpts, ListOpts, Scope};
//! use mistral_workbooks::{CancelToken, ServiceClient, StaticToken};
//!
//! async fn example() -> mistral_workbooks::Result<()> {
//!     let client = ServiceClient::connect("http://controller:8989/v2", StaticToken::from_env()?)?;
//!     let cancel = CancelToken::new();
//!
//!     let opts = CreateOpts::new(std::fs::read("workbook.yaml").unwrap_or_default())
//!         .namespace("some-namespace")
//!         .scope(Scope::Private);
//!     let workbook = workbooks::create(&client, &cancel, &opts).await?;
//!
//!     let all = workbooks::list_all(&client, &cancel, &ListOpts::default()).await?;
//!     println!("{} workbooks", all.len());
//!
//!     workbooks::delete(&client, &cancel, &workbook.id).await
//! }
//! ```

pub mod filter;
mod requests;
mod results;
pub mod time;

pub use filter::{FilterType, ListDateFilter, ListFilter, ListQuery, QueryValue};
pub use requests::{create, delete, get, list, list_all, CreateOpts, ListOpts, SortDir};
pub use results::{Scope, Workbook, WorkbookPage};
