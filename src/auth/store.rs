//! Profile & Role Storage
//! Mission: SQLite persistence for identity records and the fixed role set

use crate::auth::models::{Profile, ProfileStatus, Role, RoleName};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

/// Stores profiles, roles, and their assignments.
///
/// Lookups return `Ok(None)` for missing rows, never an error; callers
/// decide what "not found" means at their boundary.
pub struct AuthStore {
    db_path: String,
}

impl AuthStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                id TEXT PRIMARY KEY,
                role_name TEXT UNIQUE NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                activation_code INTEGER NOT NULL,
                status TEXT NOT NULL,
                last_login TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profile_roles (
                profile_id TEXT NOT NULL,
                role_id TEXT NOT NULL,
                PRIMARY KEY (profile_id, role_id),
                FOREIGN KEY (profile_id) REFERENCES profiles(id),
                FOREIGN KEY (role_id) REFERENCES roles(id)
            )",
            [],
        )?;

        self.seed_roles(&conn)?;

        Ok(())
    }

    /// Insert the fixed role set once; reruns are no-ops.
    fn seed_roles(&self, conn: &Connection) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut seeded = 0;
        for role in RoleName::ALL {
            seeded += conn.execute(
                "INSERT OR IGNORE INTO roles (id, role_name, status, created_at)
                 VALUES (?1, ?2, 'ACTIVE', ?3)",
                params![Uuid::new_v4().to_string(), role.as_str(), now],
            )?;
        }
        if seeded > 0 {
            info!("seeded {seeded} roles");
        }
        Ok(())
    }

    pub fn find_role_by_name(&self, name: RoleName) -> Result<Option<Role>> {
        let conn = Connection::open(&self.db_path)?;
        let role = conn
            .query_row(
                "SELECT id, role_name, status, created_at FROM roles WHERE role_name = ?1",
                params![name.as_str()],
                map_role_row,
            )
            .optional()?;
        Ok(role)
    }

    pub fn list_roles(&self) -> Result<Vec<Role>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt =
            conn.prepare("SELECT id, role_name, status, created_at FROM roles ORDER BY role_name")?;
        let roles = stmt
            .query_map([], map_role_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roles)
    }

    pub fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.find_profile_by_email(email)?.is_some())
    }

    /// Insert a new profile in PENDING status with one assigned role.
    pub fn create_profile(
        &self,
        email: &str,
        password_hash: &str,
        activation_code: u32,
        role: &Role,
    ) -> Result<Profile> {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            activation_code,
            status: ProfileStatus::Pending,
            last_login: None,
            roles: vec![role.clone()],
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO profiles (id, email, password_hash, activation_code, status, last_login, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.id.to_string(),
                profile.email,
                profile.password_hash,
                profile.activation_code,
                profile.status.as_str(),
                profile.last_login,
                profile.created_at,
            ],
        )
        .context("Failed to insert profile")?;
        conn.execute(
            "INSERT INTO profile_roles (profile_id, role_id) VALUES (?1, ?2)",
            params![profile.id.to_string(), role.id.to_string()],
        )?;

        info!(email = %profile.email, role = role.role_name.as_str(), "profile created");

        Ok(profile)
    }

    pub fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let conn = Connection::open(&self.db_path)?;
        let row = conn
            .query_row(
                "SELECT id, email, password_hash, activation_code, status, last_login, created_at
                 FROM profiles WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, email, password_hash, activation_code, status, last_login, created_at)) = row
        else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT r.id, r.role_name, r.status, r.created_at
             FROM roles r JOIN profile_roles pr ON pr.role_id = r.id
             WHERE pr.profile_id = ?1 ORDER BY r.role_name",
        )?;
        let roles = stmt
            .query_map(params![id], map_role_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Profile {
            id: Uuid::parse_str(&id).context("corrupt profile id")?,
            email,
            password_hash,
            activation_code,
            status: ProfileStatus::parse(&status).unwrap_or(ProfileStatus::Pending),
            last_login,
            roles,
            created_at,
        }))
    }

    pub fn assign_role(&self, profile_id: Uuid, role: &Role) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT OR IGNORE INTO profile_roles (profile_id, role_id) VALUES (?1, ?2)",
            params![profile_id.to_string(), role.id.to_string()],
        )?;
        Ok(())
    }

    pub fn set_last_login(&self, email: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE profiles SET last_login = ?1 WHERE email = ?2",
            params![Utc::now().to_rfc3339(), email],
        )?;
        Ok(())
    }

    /// Flip a PENDING profile to ACTIVE after code verification.
    pub fn activate(&self, email: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE profiles SET status = 'ACTIVE' WHERE email = ?1",
            params![email],
        )?;
        Ok(())
    }

    pub fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE profiles SET password_hash = ?1 WHERE email = ?2",
            params![password_hash, email],
        )?;
        Ok(())
    }

    /// Soft delete: status flag only, the row stays.
    pub fn soft_delete(&self, email: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE profiles SET status = 'DELETED' WHERE email = ?1",
            params![email],
        )?;
        Ok(())
    }

    /// Test hook: hard-remove a role row to prove cache hits skip persistence.
    #[cfg(test)]
    pub fn purge_role(&self, name: RoleName) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute("DELETE FROM roles WHERE role_name = ?1", params![name.as_str()])?;
        Ok(())
    }

    /// Test hook: hard-remove a profile row and its role links.
    #[cfg(test)]
    pub fn purge_profile(&self, email: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "DELETE FROM profile_roles WHERE profile_id IN
                 (SELECT id FROM profiles WHERE email = ?1)",
            params![email],
        )?;
        conn.execute("DELETE FROM profiles WHERE email = ?1", params![email])?;
        Ok(())
    }
}

fn map_role_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(Role {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        role_name: RoleName::parse(&name).unwrap_or(RoleName::Rmb),
        status: row.get(2)?,
        created_at: row.get(3)?,
    })
}
