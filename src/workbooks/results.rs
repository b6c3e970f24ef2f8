//! Workbook entity and list page

use super::time;
use crate::error::{BoxError, Error, Result};
use crate::mistral::http::HttpResponse;
use crate::pagination::Page;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility of a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Private,
    Public,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Private => "private",
            Scope::Public => "public",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(Scope::Private),
            "public" => Ok(Scope::Public),
            other => Err(Error::encoding(
                "scope",
                format!("{:?} is not one of private, public", other),
            )),
        }
    }
}

/// A workbook as stored by the workflow service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub id: String,

    /// Workbook definition in the Mistral v2 DSL, kept verbatim
    pub definition: String,

    pub name: String,

    #[serde(default)]
    pub namespace: String,

    /// Owning project
    #[serde(default)]
    pub project_id: String,

    pub scope: Scope,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(with = "time")]
    pub created_at: DateTime<Utc>,

    #[serde(default, with = "time::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Workbook {
    pub(crate) fn from_body(operation: &'static str, body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::decode(operation, e))
    }
}

#[derive(Deserialize)]
struct WorkbookList {
    #[serde(default)]
    workbooks: Vec<Workbook>,
    #[serde(default)]
    next: Option<String>,
}

/// One page of a workbook listing
#[derive(Debug, Clone)]
pub struct WorkbookPage {
    pub status: StatusCode,
    pub workbooks: Vec<Workbook>,
    pub next: Option<String>,
}

impl Page for WorkbookPage {
    type Item = Workbook;

    fn from_response(response: HttpResponse) -> std::result::Result<Self, BoxError> {
        if response.status == StatusCode::NO_CONTENT {
            return Ok(Self {
                status: response.status,
                workbooks: Vec::new(),
                next: None,
            });
        }

        let list: WorkbookList = serde_json::from_slice(&response.body)?;
        Ok(Self {
            status: response.status,
            workbooks: list.workbooks,
            next: list.next,
        })
    }

    fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.workbooks.is_empty()
    }

    fn next_page_url(&self) -> Option<&str> {
        self.next.as_deref()
    }

    fn into_items(self) -> Vec<Workbook> {
        self.workbooks
    }
}
