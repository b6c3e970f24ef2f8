//! Client for the workbooks resource of the OpenStack Workflow (Mistral) v2 API
//!
//! - [`mistral`] - transport, authentication and the service client
//! - [`workbooks`] - create, get, list and delete workbooks
//! - [`pagination`] - linked-page walking shared by list calls
//! - [`config`] - persisted defaults for the `wbk` command line tool
//!
//! Every call takes a [`CancelToken`]; cancelling it aborts the request in
//! flight and the call returns [`Error::Cancelled`].

pub mod cancel;
pub mod config;
pub mod error;
pub mod mistral;
pub mod pagination;
pub mod workbooks;

pub use cancel::CancelToken;
pub use error::{ApiError, Error, Result};
pub use mistral::auth::{StaticToken, TokenProvider};
pub use mistral::client::ServiceClient;
pub use mistral::http::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use pagination::{Page, Pager};
