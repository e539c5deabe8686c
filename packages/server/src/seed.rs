use sea_orm::*;
use tracing::info;

use crate::config::AdminSeedConfig;
use crate::entity::user;
use crate::utils::hash;

/// Create the configured administrator unless the username already exists.
///
/// An existing user of that name is left untouched, including its password.
pub async fn seed_admin<C: ConnectionTrait>(
    db: &C,
    admin: &AdminSeedConfig,
) -> anyhow::Result<()> {
    let exists = user::Entity::find()
        .filter(user::Column::Username.eq(&admin.username))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    let password = hash::hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;

    let model = user::ActiveModel {
        username: Set(admin.username.clone()),
        password: Set(password),
        is_admin: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(username = %admin.username, "seeded administrator"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
