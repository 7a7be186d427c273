//! Database integration tests
//!
//! Each test gets its own migrated database from `#[sqlx::test]`, so
//! `DATABASE_URL` must point at a PostgreSQL server.

pub mod triggers;
