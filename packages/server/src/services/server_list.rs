use std::collections::HashMap;

use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Select,
};

use crate::entity::{category, server, server_member};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::server::{
    CountedServerResponse, ServerListEntry, ServerListQuery, ServerResponse,
};

/// A lazily built server query.
///
/// Every step consumes the listing and returns a narrowed one; nothing is
/// executed until [`ServerListing::fetch`].
#[derive(Clone, Debug)]
pub struct ServerListing {
    select: Select<server::Entity>,
    with_num_members: bool,
}

impl ServerListing {
    pub fn all() -> Self {
        Self {
            select: server::Entity::find(),
            with_num_members: false,
        }
    }

    /// Keep servers whose category name equals `name` exactly.
    pub fn in_category(self, name: &str) -> Self {
        let category_ids = Query::select()
            .column(category::Column::Id)
            .from(category::Entity)
            .and_where(category::Column::Name.eq(name))
            .to_owned();

        Self {
            select: self
                .select
                .filter(server::Column::CategoryId.in_subquery(category_ids)),
            ..self
        }
    }

    /// Keep servers that `user_id` is a member of.
    pub fn with_member(self, user_id: i32) -> Self {
        let joined = Query::select()
            .column(server_member::Column::ServerId)
            .from(server_member::Entity)
            .and_where(server_member::Column::UserId.eq(user_id))
            .to_owned();

        Self {
            select: self.select.filter(server::Column::Id.in_subquery(joined)),
            ..self
        }
    }

    /// Attach `num_members` to every fetched server.
    pub fn annotate_num_members(self) -> Self {
        Self {
            with_num_members: true,
            ..self
        }
    }

    /// Keep the first `qty` servers in id order. `qty` must fit in `i64`.
    ///
    /// The window is fixed here, so later steps narrow within it rather than
    /// refilling it.
    pub fn take(self, qty: u64) -> Self {
        let window = self
            .select
            .order_by_asc(server::Column::Id)
            .select_only()
            .column(server::Column::Id)
            .limit(qty)
            .into_query();

        Self {
            select: server::Entity::find().filter(server::Column::Id.in_subquery(window)),
            ..self
        }
    }

    pub fn only_id(self, id: i32) -> Self {
        Self {
            select: self.select.filter(server::Column::Id.eq(id)),
            ..self
        }
    }

    pub async fn fetch<C: ConnectionTrait>(self, db: &C) -> Result<Vec<ServerListEntry>, DbErr> {
        let Self {
            select,
            with_num_members,
        } = self;

        let servers = select.order_by_asc(server::Column::Id).all(db).await?;

        if !with_num_members {
            return Ok(servers
                .into_iter()
                .map(|s| ServerListEntry::Plain(ServerResponse::from(s)))
                .collect());
        }

        let counts = member_counts(db, servers.iter().map(|s| s.id).collect()).await?;
        Ok(servers
            .into_iter()
            .map(|s| {
                let num_members = counts.get(&s.id).copied().unwrap_or(0);
                ServerListEntry::WithMembers(CountedServerResponse {
                    server: ServerResponse::from(s),
                    num_members,
                })
            })
            .collect())
    }
}

/// Member count per server id. Servers without members are absent.
async fn member_counts<C: ConnectionTrait>(
    db: &C,
    server_ids: Vec<i32>,
) -> Result<HashMap<i32, u64>, DbErr> {
    if server_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = server_member::Entity::find()
        .select_only()
        .column(server_member::Column::ServerId)
        .column_as(server_member::Column::UserId.count(), "num_members")
        .filter(server_member::Column::ServerId.is_in(server_ids))
        .group_by(server_member::Column::ServerId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, n)| (id, n.max(0) as u64))
        .collect())
}

/// Run the server list for `query` on behalf of `user`.
///
/// Steps run in a fixed order: authentication, category, membership,
/// annotation, `qty` window, then `by_serverid`. A `by_serverid` outside the
/// `qty` window is reported as not found.
pub async fn list_servers<C: ConnectionTrait>(
    db: &C,
    query: &ServerListQuery,
    user: Option<&AuthUser>,
) -> Result<Vec<ServerListEntry>, AppError> {
    if query.requires_auth() && user.is_none() {
        return Err(AppError::TokenMissing);
    }

    let listing = ServerListing::all();

    let listing = match query.category() {
        Some(name) => listing.in_category(name),
        None => listing,
    };

    let listing = match user {
        Some(user) if query.by_user() => listing.with_member(user.user_id),
        _ => listing,
    };

    let listing = if query.with_num_members() {
        listing.annotate_num_members()
    } else {
        listing
    };

    let listing = match query.qty() {
        Some(raw) => {
            let qty: i64 = raw
                .parse()
                .map_err(|e| AppError::Internal(format!("unparsable qty {raw:?}: {e}")))?;
            let qty = u64::try_from(qty)
                .map_err(|_| AppError::Internal(format!("negative qty {qty}")))?;
            listing.take(qty)
        }
        None => listing,
    };

    let Some(raw_id) = query.by_serverid() else {
        return Ok(listing.fetch(db).await?);
    };

    let id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("invalid".into()))?;
    let not_found = || AppError::Validation(format!("Server with id {id} not found"));

    let Ok(id) = i32::try_from(id) else {
        return Err(not_found());
    };
    let servers = listing.only_id(id).fetch(db).await?;
    if servers.is_empty() {
        return Err(not_found());
    }

    Ok(servers)
}
