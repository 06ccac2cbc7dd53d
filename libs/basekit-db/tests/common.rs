#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use basekit_db::{BaseEntity, DbConfig, FieldKind, FieldMap, SessionManager};
use sea_orm::ConnectionTrait;

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(unique)]
        pub email: String,
        pub name: String,
        pub age: i32,
        pub nickname: Option<String>,
        pub deleted: bool,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl BaseEntity for user::Entity {
    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", user::Column::Id, FieldKind::I64)
            .insert("email", user::Column::Email, FieldKind::String)
            .insert("name", user::Column::Name, FieldKind::String)
            .insert("age", user::Column::Age, FieldKind::I32)
            .insert_nullable("nickname", user::Column::Nickname, FieldKind::String)
            .insert("deleted", user::Column::Deleted, FieldKind::Bool)
            .insert("created_at", user::Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert("updated_at", user::Column::UpdatedAt, FieldKind::DateTimeUtc)
    }

    fn id_col() -> Self::Column {
        user::Column::Id
    }

    fn soft_delete_col() -> Option<Self::Column> {
        Some(user::Column::Deleted)
    }

    fn created_at_col() -> Option<Self::Column> {
        Some(user::Column::CreatedAt)
    }

    fn updated_at_col() -> Option<Self::Column> {
        Some(user::Column::UpdatedAt)
    }
}

/// Entity without soft delete or audit columns.
pub mod tag {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub label: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl BaseEntity for tag::Entity {
    fn fields() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", tag::Column::Id, FieldKind::I64)
            .insert("label", tag::Column::Label, FieldKind::String)
    }

    fn id_col() -> Self::Column {
        tag::Column::Id
    }

    fn soft_delete_col() -> Option<Self::Column> {
        None
    }

    fn created_at_col() -> Option<Self::Column> {
        None
    }

    fn updated_at_col() -> Option<Self::Column> {
        None
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        nickname TEXT NULL,
        deleted BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL
    )",
];

/// Fresh in-memory database with the test schema.
pub async fn sessions() -> SessionManager {
    let sessions = SessionManager::connect(&DbConfig::default())
        .await
        .expect("connect to sqlite");
    for ddl in SCHEMA {
        sessions
            .connection()
            .execute_unprepared(ddl)
            .await
            .expect("create schema");
    }
    sessions
}
