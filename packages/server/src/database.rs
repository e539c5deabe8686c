use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

use crate::entity::{category, channel, server, server_member, user};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("chat_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create every table on a fresh database, referenced tables first.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());
    let tables = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(server::Entity),
        schema.create_table_from_entity(server_member::Entity),
        schema.create_table_from_entity(channel::Entity),
    ];

    for mut stmt in tables {
        stmt.if_not_exists();
        db.execute(&stmt).await?;
    }

    Ok(())
}
