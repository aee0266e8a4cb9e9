//! Cached user profile repository

use crate::error::Result;
use crate::models::Profile;
use libsql::{params, Connection};

/// Trait for profile storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    /// The cached profile, if a sync has stored one
    async fn load(&self) -> Result<Option<Profile>>;

    /// Store the profile, replacing any previous one
    async fn upsert(&self, profile: &Profile) -> Result<()>;

    /// Forget the cached profile
    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `ProfileRepository`
pub struct LibSqlProfileRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlProfileRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn replace_profile(&self, profile: &Profile) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        // Only one user is cached at a time
        self.conn
            .execute("DELETE FROM profile WHERE id != ?1", params![profile.id])
            .await?;
        self.conn
            .execute(
                "INSERT INTO profile (id, email, name, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     email = excluded.email,
                     name = excluded.name,
                     updated_at = excluded.updated_at",
                params![profile.id, profile.email.as_str(), profile.name.clone(), now],
            )
            .await?;
        Ok(())
    }
}

impl ProfileRepository for LibSqlProfileRepository<'_> {
    async fn load(&self) -> Result<Option<Profile>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, name FROM profile ORDER BY updated_at DESC LIMIT 1",
                (),
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        Ok(Some(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get::<Option<String>>(2)?,
        }))
    }

    async fn upsert(&self, profile: &Profile) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        if let Err(e) = self.replace_profile(profile).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM profile", ()).await?;
        Ok(())
    }
}
