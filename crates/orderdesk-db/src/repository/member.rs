//! # Member Repository
//!
//! Registration and lookup of members.
//!
//! Names are not unique at the schema level; [`MemberRepository::register`]
//! enforces uniqueness before inserting, the same check the signup flow uses.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use orderdesk_core::validation::validate_name;
use orderdesk_core::{Address, CoreError, Member};

/// Repository for member database operations.
///
/// ## Usage
/// ```rust,ignore
/// let members = db.members();
/// let member = members.register("userA", Address::new("Seoul", "1", "1111")).await?;
/// let found = members.find_by_name("userA").await?;
/// ```
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Inserts a member row as-is.
    pub async fn insert(&self, member: &Member) -> DbResult<Member> {
        debug!(id = %member.id, name = %member.name, "Inserting member");

        sqlx::query(
            r#"
            INSERT INTO members (id, name, city, street, zipcode)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.address.city)
        .bind(&member.address.street)
        .bind(&member.address.zipcode)
        .execute(&self.pool)
        .await?;

        Ok(member.clone())
    }

    /// Validates and registers a new member.
    ///
    /// ## Returns
    /// * `Ok(Member)` - The stored member with its new id
    /// * `Err(DbError::Domain(CoreError::DuplicateMember))` - Name already taken
    /// * `Err(DbError::Domain(CoreError::Validation))` - Blank or over-long name
    pub async fn register(&self, name: &str, address: Address) -> DbResult<Member> {
        validate_name("name", name).map_err(CoreError::from)?;
        let name = name.trim();

        if !self.find_by_name(name).await?.is_empty() {
            return Err(CoreError::DuplicateMember(name.to_string()).into());
        }

        self.insert(&Member::new(name, address)).await
    }

    /// Gets a member by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, city, street, zipcode FROM members WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Gets a member by id, failing with `NotFound` when missing.
    pub async fn require(&self, id: &str) -> DbResult<Member> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Member", id))
    }

    /// Lists all members by name.
    pub async fn find_all(&self) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT id, name, city, street, zipcode FROM members ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Members whose name equals `name` exactly.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT id, name, city, street, zipcode FROM members WHERE name = ?1 ORDER BY id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        debug!(name = %name, count = members.len(), "Members by name");
        Ok(members)
    }

    /// Counts members (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
