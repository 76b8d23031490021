use lazy_static::lazy_static;
use rusqlite_migration::{Migrations, M};

lazy_static! {
    pub static ref MIGRATIONS: Migrations<'static> = Migrations::new(vec![
        M::up(
            r#"
            CREATE TABLE notes (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT 'gray',

                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                user_id BLOB NOT NULL CHECK(length(user_id) = 16)
            );

            CREATE INDEX notes_user_id_created_at ON notes (user_id, created_at DESC);
        "#
        ),
        M::up(
            r#"
            CREATE TABLE profiles (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE,
                email TEXT,
                name TEXT,
                avatar_url TEXT,

                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME
            );
        "#
        ),
    ]);
}

