use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_max_len, validate_name};
use crate::entity::server;
use crate::error::AppError;

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

/// Raw query parameters of the server list.
///
/// Values stay as strings: how each one is parsed, and how a parse failure is
/// reported, is part of the list operation itself.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServerListQuery {
    /// Keep only servers whose category name equals this exactly.
    pub category: Option<String>,
    /// Truncate the result to the first `qty` servers.
    pub qty: Option<String>,
    /// `true` keeps only servers the caller is a member of. Requires authentication.
    pub by_user: Option<String>,
    /// Narrow to the server with this id. Requires authentication.
    pub by_serverid: Option<String>,
    /// `true` adds `num_members` to every returned server.
    pub with_num_members: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ServerListQuery {
    pub fn category(&self) -> Option<&str> {
        present(&self.category)
    }

    pub fn qty(&self) -> Option<&str> {
        present(&self.qty)
    }

    pub fn by_user(&self) -> bool {
        self.by_user.as_deref() == Some("true")
    }

    pub fn by_serverid(&self) -> Option<&str> {
        present(&self.by_serverid)
    }

    pub fn with_num_members(&self) -> bool {
        self.with_num_members.as_deref() == Some("true")
    }

    /// Whether the request touches user- or id-scoped data.
    pub fn requires_auth(&self) -> bool {
        self.by_user() || self.by_serverid().is_some()
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateServerRequest {
    #[schema(example = "Rustaceans")]
    pub name: String,
    #[schema(example = 1)]
    pub category_id: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ServerResponse {
    pub id: i32,
    #[schema(example = "Rustaceans")]
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<server::Model> for ServerResponse {
    fn from(m: server::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            owner_id: m.owner_id,
            category_id: m.category_id,
            created_at: m.created_at,
        }
    }
}

/// A server annotated with its member count.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CountedServerResponse {
    #[serde(flatten)]
    pub server: ServerResponse,
    #[schema(example = 12)]
    pub num_members: u64,
}

/// One element of the server list. Which variant is produced is decided by
/// the `with_num_members` flag for the whole list, never per row.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ServerListEntry {
    WithMembers(CountedServerResponse),
    Plain(ServerResponse),
}

impl ServerListEntry {
    pub fn server(&self) -> &ServerResponse {
        match self {
            Self::WithMembers(counted) => &counted.server,
            Self::Plain(server) => server,
        }
    }

    pub fn num_members(&self) -> Option<u64> {
        match self {
            Self::WithMembers(counted) => Some(counted.num_members),
            Self::Plain(_) => None,
        }
    }
}

pub fn validate_create_server(req: &CreateServerRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, NAME_MAX)?;
    validate_max_len("Description", req.description.as_deref(), DESCRIPTION_MAX)
}
