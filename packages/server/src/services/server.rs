use chrono::Utc;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionSession, TransactionTrait,
};
use tracing::info;

use crate::entity::{category, channel, server, server_member};
use crate::error::AppError;
use crate::models::server::CreateServerRequest;
use crate::models::shared::normalize_optional;

pub struct ServerService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ServerService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<server::Model, AppError> {
        server::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Server not found".into()))
    }

    /// Create a server owned by `owner_id`. The category must already exist.
    pub async fn create(
        &self,
        owner_id: i32,
        req: CreateServerRequest,
    ) -> Result<server::Model, AppError> {
        if category::Entity::find_by_id(req.category_id)
            .one(self.conn)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(format!(
                "Category with id {} does not exist",
                req.category_id
            )));
        }

        let model = server::ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(normalize_optional(req.description)),
            owner_id: Set(owner_id),
            category_id: Set(req.category_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        info!(server_id = model.id, owner_id, "server created");
        Ok(model)
    }

    pub async fn is_member(&self, server_id: i32, user_id: i32) -> Result<bool, AppError> {
        Ok(server_member::Entity::find_by_id((server_id, user_id))
            .one(self.conn)
            .await?
            .is_some())
    }

    /// Add `user_id` to the member set. Joining twice is a no-op, including
    /// when two joins race.
    pub async fn join(&self, server_id: i32, user_id: i32) -> Result<(), AppError> {
        self.find(server_id).await?;

        let membership = server_member::ActiveModel {
            server_id: Set(server_id),
            user_id: Set(user_id),
            joined_at: Set(Utc::now()),
        };
        let result = server_member::Entity::insert(membership)
            .on_conflict(
                OnConflict::columns([server_member::Column::ServerId, server_member::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(_) => info!(server_id, user_id, "member joined"),
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Remove `user_id` from the member set. Leaving twice is a no-op.
    pub async fn leave(&self, server_id: i32, user_id: i32) -> Result<(), AppError> {
        self.find(server_id).await?;
        server_member::Entity::delete_by_id((server_id, user_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn channels(&self, server_id: i32) -> Result<Vec<channel::Model>, AppError> {
        self.find(server_id).await?;
        Ok(channel::Entity::find()
            .filter(channel::Column::ServerId.eq(server_id))
            .order_by_asc(channel::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Delete a server with its channels and memberships in one transaction.
    ///
    /// `authorize` sees the locked row and can veto the deletion.
    pub async fn delete<F>(&self, id: i32, authorize: F) -> Result<(), AppError>
    where
        C: TransactionTrait,
        F: FnOnce(&server::Model) -> Result<(), AppError>,
    {
        let txn = self.conn.begin().await?;
        let server = find_server_for_update(&txn, id).await?;
        authorize(&server)?;

        let channels = channel::Entity::delete_many()
            .filter(channel::Column::ServerId.eq(id))
            .exec(&txn)
            .await?;
        server_member::Entity::delete_many()
            .filter(server_member::Column::ServerId.eq(id))
            .exec(&txn)
            .await?;
        server::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(server_id = id, channels = channels.rows_affected, "server deleted");
        Ok(())
    }
}

async fn find_server_for_update<C: ConnectionTrait>(
    txn: &C,
    id: i32,
) -> Result<server::Model, AppError> {
    server::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Server not found".into()))
}
