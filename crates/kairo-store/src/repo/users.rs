use crate::error::{Result, StoreError};
use crate::temp_table::TempLookupTable;
use chrono::NaiveDate;
use kairo_core::domain::{canonical_phone, DirectoryUser, Gender, UserId};
use rusqlite::{params, Connection, ErrorCode};
use std::str::FromStr;

const USER_COLUMNS: &str =
    "u.id, u.name, u.phone_number, u.profile_picture, u.date_of_birth, u.gender, u.created_at";

#[derive(Debug, Clone)]
pub struct UserNew {
    pub name: Option<String>,
    pub phone_number: String,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

pub struct UsersRepo<'a> {
    conn: &'a Connection,
}

impl<'a> UsersRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Registers a user under the canonical form of `input.phone_number`.
    pub fn create(&self, now_utc: i64, input: UserNew) -> Result<DirectoryUser> {
        let phone_number = canonical_phone(&input.phone_number).ok_or_else(|| {
            StoreError::Core(kairo_core::CoreError::InvalidPhone(
                input.phone_number.clone(),
            ))
        })?;
        let name = input
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let user = DirectoryUser {
            id: UserId::new(),
            name,
            phone_number,
            profile_picture: input.profile_picture,
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            created_at: now_utc,
        };

        let inserted = self.conn.execute(
            "INSERT INTO users (id, name, phone_number, profile_picture, date_of_birth, gender, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                user.id.to_string(),
                user.name,
                user.phone_number,
                user.profile_picture,
                user.date_of_birth.map(|date| date.format("%Y-%m-%d").to_string()),
                user.gender.map(|gender| gender.as_str()),
                now_utc,
            ],
        );
        if let Err(err) = inserted {
            if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
                if failure.code == ErrorCode::ConstraintViolation
                    && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                {
                    return Err(StoreError::DuplicatePhone(user.phone_number));
                }
            }
            return Err(err.into());
        }

        Ok(user)
    }

    pub fn get(&self, id: UserId) -> Result<Option<DirectoryUser>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn get_by_phone(&self, phone: &str) -> Result<Option<DirectoryUser>> {
        let Some(canonical) = canonical_phone(phone) else {
            return Ok(None);
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.phone_number = ?1;"
        ))?;
        let mut rows = stmt.query([canonical])?;
        if let Some(row) = rows.next()? {
            Ok(Some(user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list(&self) -> Result<Vec<DirectoryUser>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u ORDER BY u.created_at ASC, u.id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(user_from_row(row)?);
        }
        Ok(users)
    }

    pub fn delete(&self, id: UserId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Users whose stored phone equals one of `tokens` verbatim.
    pub fn find_by_exact_phones(&self, tokens: &[String]) -> Result<Vec<DirectoryUser>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let temp_table = TempLookupTable::with_tokens(self.conn, tokens)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS}
             FROM users u
             INNER JOIN {} t ON t.phone = u.phone_number
             ORDER BY u.created_at ASC, u.id ASC;",
            temp_table.name()
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(user_from_row(row)?);
        }
        Ok(users)
    }

    /// Resolves every pattern in one query, returning up to `limit` users
    /// per pattern in registration order. The result is aligned with
    /// `patterns`.
    pub fn find_by_phone_patterns(
        &self,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<Vec<DirectoryUser>>> {
        let mut found = vec![Vec::new(); patterns.len()];
        if patterns.is_empty() || limit == 0 {
            return Ok(found);
        }
        let temp_table = TempLookupTable::with_patterns(self.conn, patterns)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT *
             FROM (
               SELECT p.slot AS slot, {USER_COLUMNS},
                      ROW_NUMBER() OVER (
                        PARTITION BY p.slot ORDER BY u.created_at ASC, u.id ASC
                      ) AS hit_rank
               FROM {} p
               INNER JOIN users u
                 ON p.digits <> ''
                AND (instr(u.phone_number, p.digits) > 0
                     OR substr(u.phone_number, -length(p.tail)) = p.tail)
             )
             WHERE hit_rank <= ?1
             ORDER BY slot ASC, hit_rank ASC;",
            temp_table.name()
        ))?;
        let mut rows = stmt.query([limit as i64])?;
        while let Some(row) = rows.next()? {
            let slot: i64 = row.get(0)?;
            let user = user_from_row_at(row, 1)?;
            if let Some(bucket) = usize::try_from(slot).ok().and_then(|i| found.get_mut(i)) {
                bucket.push(user);
            }
        }
        Ok(found)
    }

    pub fn find_by_phone_pattern(&self, digits: &str, limit: usize) -> Result<Vec<DirectoryUser>> {
        let mut found = self.find_by_phone_patterns(&[digits.to_string()], limit)?;
        Ok(found.pop().unwrap_or_default())
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<DirectoryUser> {
    user_from_row_at(row, 0)
}

fn user_from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> Result<DirectoryUser> {
    let id_str: String = row.get(offset)?;
    let id = UserId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let date_of_birth = row
        .get::<_, Option<String>>(offset + 4)?
        .map(|raw| kairo_core::domain::parse_date_of_birth(&raw))
        .transpose()?;
    let gender = row
        .get::<_, Option<String>>(offset + 5)?
        .map(|raw| Gender::from_str(&raw))
        .transpose()?;
    Ok(DirectoryUser {
        id,
        name: row.get(offset + 1)?,
        phone_number: row.get(offset + 2)?,
        profile_picture: row.get(offset + 3)?,
        date_of_birth,
        gender,
        created_at: row.get(offset + 6)?,
    })
}
