use common::storage::{FileStore, StoragePath};
use sea_orm::sea_query::{LockType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionSession, TransactionTrait,
};
use tracing::{info, warn};

use crate::entity::{category, channel, server, server_member};
use crate::error::AppError;

/// Desired state of a category. `id: None` creates a new row.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl From<category::Model> for CategoryDraft {
    fn from(m: category::Model) -> Self {
        Self {
            id: Some(m.id),
            name: m.name,
            description: m.description,
            icon: m.icon,
        }
    }
}

/// Category persistence. The only code path that removes icon files.
pub struct CategoryService<'a, C: ConnectionTrait> {
    conn: &'a C,
    files: &'a dyn FileStore,
}

impl<'a, C: ConnectionTrait> CategoryService<'a, C> {
    pub fn new(conn: &'a C, files: &'a dyn FileStore) -> Self {
        Self { conn, files }
    }

    pub async fn find(&self, id: i32) -> Result<category::Model, AppError> {
        category::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }

    /// Insert or update a category.
    ///
    /// When an existing category's icon changes, the previously stored file is
    /// deleted before the new state is written.
    pub async fn save(&self, draft: CategoryDraft) -> Result<category::Model, AppError> {
        let Some(id) = draft.id else {
            let model = category::ActiveModel {
                name: Set(draft.name),
                description: Set(draft.description),
                icon: Set(draft.icon),
                ..Default::default()
            }
            .insert(self.conn)
            .await?;
            info!(category_id = model.id, "category created");
            return Ok(model);
        };

        let existing = self.find(id).await?;
        if existing.icon != draft.icon
            && let Some(old) = existing.icon.as_deref()
        {
            self.remove_file(old).await?;
            info!(category_id = id, old_icon = old, new_icon = ?draft.icon, "category icon replaced");
        }

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.description = Set(draft.description);
        active.icon = Set(draft.icon);
        Ok(active.update(self.conn).await?)
    }

    /// Delete a category together with its servers, their channels and
    /// memberships, then its icon file.
    ///
    /// Rows go in one transaction; the icon is removed only after commit.
    pub async fn delete(&self, id: i32) -> Result<(), AppError>
    where
        C: TransactionTrait,
    {
        let txn = self.conn.begin().await?;
        let existing = category::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

        let server_ids = Query::select()
            .column(server::Column::Id)
            .from(server::Entity)
            .and_where(server::Column::CategoryId.eq(id))
            .to_owned();

        let channels = channel::Entity::delete_many()
            .filter(channel::Column::ServerId.in_subquery(server_ids.clone()))
            .exec(&txn)
            .await?;
        server_member::Entity::delete_many()
            .filter(server_member::Column::ServerId.in_subquery(server_ids))
            .exec(&txn)
            .await?;
        let servers = server::Entity::delete_many()
            .filter(server::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if let Some(icon) = existing.icon.as_deref() {
            self.remove_file(icon).await?;
        }

        info!(
            category_id = id,
            servers = servers.rows_affected,
            channels = channels.rows_affected,
            "category deleted"
        );
        Ok(())
    }

    async fn remove_file(&self, stored: &str) -> Result<(), AppError> {
        let path = match StoragePath::parse(stored) {
            Ok(path) => path,
            Err(e) => {
                warn!(icon = stored, error = %e, "skipping unparsable icon path");
                return Ok(());
            }
        };
        if !self.files.delete(&path).await? {
            warn!(icon = stored, "icon file already missing");
        }
        Ok(())
    }
}
