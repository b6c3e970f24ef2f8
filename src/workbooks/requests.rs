//! Workbook operations
//!
//! | Operation | Request                      | Success |
//! |-----------|------------------------------|---------|
//! | create    | `POST /workbooks?<query>`    | 201     |
//! | get       | `GET /workbooks/{id}`        | 200     |
//! | list      | `GET /workbooks?<query>`     | 200/204 |
//! | delete    | `DELETE /workbooks/{id}`     | 202     |

use super::filter::{ListDateFilter, ListFilter, ListQuery, QueryValue};
use super::results::{Scope, Workbook, WorkbookPage};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::mistral::client::{RequestOpts, ServiceClient};
use crate::pagination::Pager;
use reqwest::Method;
use std::fmt;
use std::str::FromStr;
use url::Url;

const RESOURCE: &str = "workbooks";

/// Parameters of a create call
#[derive(Debug, Clone, Default)]
pub struct CreateOpts {
    /// Workbook definition written in the Mistral v2 DSL. Sent verbatim.
    pub definition: Vec<u8>,
    pub scope: Option<Scope>,
    pub namespace: Option<String>,
}

impl CreateOpts {
    pub fn new(definition: impl Into<Vec<u8>>) -> Self {
        Self {
            definition: definition.into(),
            ..Self::default()
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Query parameters sent alongside the definition
    pub fn to_query(&self) -> Result<ListQuery> {
        if self.definition.is_empty() {
            return Err(Error::encoding("definition", "workbook definition is empty"));
        }

        let mut query = ListQuery::new();
        if let Some(namespace) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            query.scalar("namespace", namespace);
        }
        if let Some(scope) = self.scope {
            query.scalar("scope", scope.as_str());
        }
        Ok(query)
    }
}

/// Sort direction for `sort_dirs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDir {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(Error::encoding(
                "sort_dirs",
                format!("{:?} is not one of asc, desc", other),
            )),
        }
    }
}

/// Filters and paging parameters of a list call
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    pub name: Option<ListFilter>,
    pub namespace: Option<String>,
    pub scope: Option<Scope>,
    pub project_id: Option<String>,
    /// Workbooks carrying all of these tags
    pub tags: Vec<String>,
    pub created_at: Option<ListDateFilter>,
    pub updated_at: Option<ListDateFilter>,
    /// Id of the last workbook of the previous page
    pub marker: Option<String>,
    pub limit: Option<u32>,
    pub sort_keys: Vec<String>,
    pub sort_dirs: Vec<SortDir>,
    /// Restrict the returned attributes
    pub fields: Vec<String>,
}

impl ListOpts {
    pub fn to_query(&self) -> Result<ListQuery> {
        let mut query = ListQuery::new();

        if let Some(name) = &self.name {
            query.insert("name", QueryValue::Filter(name.clone()));
        }
        if let Some(namespace) = &self.namespace {
            query.scalar("namespace", namespace.as_str());
        }
        if let Some(scope) = self.scope {
            query.scalar("scope", scope.as_str());
        }
        if let Some(project_id) = &self.project_id {
            query.scalar("project_id", project_id.as_str());
        }
        if !self.tags.is_empty() {
            query.insert("tags", QueryValue::List(self.tags.clone()));
        }
        if let Some(created_at) = &self.created_at {
            query.insert("created_at", QueryValue::Date(created_at.clone()));
        }
        if let Some(updated_at) = &self.updated_at {
            query.insert("updated_at", QueryValue::Date(updated_at.clone()));
        }
        if let Some(marker) = &self.marker {
            query.scalar("marker", marker.as_str());
        }
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err(Error::encoding("limit", "must be at least 1"));
            }
            query.scalar("limit", limit.to_string());
        }
        if !self.sort_keys.is_empty() {
            query.insert("sort_keys", QueryValue::List(self.sort_keys.clone()));
        }
        if !self.sort_dirs.is_empty() {
            if self.sort_dirs.len() > self.sort_keys.len() {
                return Err(Error::encoding(
                    "sort_dirs",
                    "more sort directions than sort keys",
                ));
            }
            let dirs = self.sort_dirs.iter().map(|d| d.as_str().to_string()).collect();
            query.insert("sort_dirs", QueryValue::List(dirs));
        }
        if !self.fields.is_empty() {
            query.insert("fields", QueryValue::List(self.fields.clone()));
        }

        Ok(query)
    }
}

fn collection_url(client: &ServiceClient, query: &ListQuery) -> Result<Url> {
    let mut url = client.service_url(&[RESOURCE])?;
    let encoded = query.encode()?;
    if !encoded.is_empty() {
        url.set_query(Some(&encoded));
    }
    Ok(url)
}

/// Upload a new workbook
pub async fn create(client: &ServiceClient, cancel: &CancelToken, opts: &CreateOpts) -> Result<Workbook> {
    const OPERATION: &str = "create workbook";

    let url = collection_url(client, &opts.to_query()?)?;

    // Plain text body; the service answers with JSON regardless
    let request = RequestOpts {
        body: Some(opts.definition.clone()),
        content_type: Some("text/plain"),
        accept_json: false,
    };
    let response = client
        .request(cancel, OPERATION, Method::POST, url, request)
        .await?;

    let workbook = Workbook::from_body(OPERATION, &response.body)?;
    tracing::debug!("Created workbook {} ({})", workbook.name, workbook.id);
    Ok(workbook)
}

/// Fetch one workbook by id or name
pub async fn get(client: &ServiceClient, cancel: &CancelToken, id: &str) -> Result<Workbook> {
    const OPERATION: &str = "get workbook";

    let url = client.service_url(&[RESOURCE, id])?;
    let response = client
        .request(cancel, OPERATION, Method::GET, url, RequestOpts::json())
        .await?;

    Workbook::from_body(OPERATION, &response.body)
}

/// Prepare a paginated listing. Nothing is sent until the pager is walked.
pub fn list(client: &ServiceClient, opts: &ListOpts) -> Result<Pager<WorkbookPage>> {
    let url = collection_url(client, &opts.to_query()?)?;
    Ok(Pager::new(client.clone(), "list workbooks", url))
}

/// List every workbook matching `opts`, following all pages
pub async fn list_all(client: &ServiceClient, cancel: &CancelToken, opts: &ListOpts) -> Result<Vec<Workbook>> {
    let workbooks = list(client, opts)?.all_pages(cancel).await?;
    tracing::debug!("Listed {} workbooks", workbooks.len());
    Ok(workbooks)
}

pub async fn delete(client: &ServiceClient, cancel: &CancelToken, id: &str) -> Result<()> {
    const OPERATION: &str = "delete workbook";

    let url = client.service_url(&[RESOURCE, id])?;
    client
        .request(cancel, OPERATION, Method::DELETE, url, RequestOpts::json())
        .await?;

    tracing::debug!("Deleted workbook {}", id);
    Ok(())
}
