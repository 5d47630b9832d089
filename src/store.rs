//! Class and student persistence.
//!
//! `RosterStore` owns the single SQLite connection for a data directory.
//! Mutations return `Result` and also remember the failure text for
//! [`RosterStore::last_error`]. Lookups that find nothing return `None`
//! or an empty list.

use std::path::Path;

use chrono::NaiveDateTime;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{error, info, warn};

use crate::db;
use crate::error::{Result, RosterError};

const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

const STUDENT_SELECT: &str = "SELECT s.id, s.name, s.student_id, s.class_id, c.name, s.photo, s.created_at
     FROM students s
     JOIN classes c ON c.id = s.class_id";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    pub id: i64,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub student_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub id: i64,
    pub name: String,
    /// Human-assigned identifier, unique across the roster.
    pub student_id: String,
    pub class_id: i64,
    pub class_name: String,
    pub photo: Option<Vec<u8>>,
    pub created_at: Option<NaiveDateTime>,
}

impl StudentRecord {
    pub fn has_photo(&self) -> bool {
        self.photo.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// Insert shape: the class is referenced by name and created on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub student_id: String,
    pub class_name: String,
    pub photo: Option<Vec<u8>>,
}

impl NewStudent {
    pub fn new(
        name: impl Into<String>,
        student_id: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            student_id: student_id.into(),
            class_name: class_name.into(),
            photo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentUpdate {
    pub id: i64,
    pub name: String,
    pub student_id: String,
    pub class_id: i64,
    pub photo: Option<Vec<u8>>,
}

impl From<StudentRecord> for StudentUpdate {
    fn from(s: StudentRecord) -> Self {
        Self {
            id: s.id,
            name: s.name,
            student_id: s.student_id,
            class_id: s.class_id,
            photo: s.photo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKey<'a> {
    Id(i64),
    Name(&'a str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub classes_created: Vec<String>,
}

pub struct RosterStore {
    conn: Connection,
    last_error: Option<String>,
}

impl RosterStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = db::open_db(db_path)?;
        info!(path = %db_path.display(), "roster database opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            last_error: None,
        }
    }

    /// Text of the most recent failed mutation, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn track<T>(&mut self, op: &'static str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            error!(op, error = %e, "roster operation failed");
            self.last_error = Some(e.to_string());
        }
        result
    }

    // ---- classes ----

    pub fn add_class(&mut self, name: &str) -> Result<i64> {
        let r = insert_class(&self.conn, name);
        if let Ok(id) = &r {
            info!(id, name = name.trim(), "class added");
        }
        self.track("add_class", r)
    }

    pub fn list_classes(&self) -> Result<Vec<ClassSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
               c.id,
               c.name,
               (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
             FROM classes c
             ORDER BY c.name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ClassSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    student_count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn class(&self, id: i64) -> Result<Option<ClassRecord>> {
        let rec = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM classes WHERE id = ?",
                [id],
                |row| {
                    Ok(ClassRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: parse_timestamp(row.get(2)?),
                    })
                },
            )
            .optional()?;
        Ok(rec)
    }

    pub fn class_id(&self, name: &str) -> Result<Option<i64>> {
        lookup_class_id(&self.conn, name)
    }

    pub fn class_exists(&self, name: &str) -> Result<bool> {
        Ok(self.class_id(name)?.is_some())
    }

    /// Deletes a class and, through the foreign key, all of its students.
    pub fn delete_class(&mut self, id: i64) -> Result<bool> {
        let r = self
            .conn
            .execute("DELETE FROM classes WHERE id = ?", [id])
            .map(|n| n > 0)
            .map_err(RosterError::from);
        if let Ok(true) = r {
            info!(id, "class deleted");
        }
        self.track("delete_class", r)
    }

    // ---- students ----

    pub fn add_student(&mut self, student: &NewStudent) -> Result<i64> {
        let r = insert_student(&self.conn, student).map(|(id, _)| id);
        if let Ok(id) = &r {
            info!(id, name = %student.name, class = %student.class_name, "student added");
        }
        self.track("add_student", r)
    }

    pub fn update_student(&mut self, update: &StudentUpdate) -> Result<bool> {
        let r = apply_update(&self.conn, update);
        if let Ok(true) = r {
            info!(id = update.id, name = %update.name, "student updated");
        }
        self.track("update_student", r)
    }

    /// Like [`update_student`](Self::update_student), but places the student
    /// in `class_name`, creating that class on demand. Class creation and the
    /// update share one transaction, so a failed update leaves no new class.
    pub fn update_student_in_class(
        &mut self,
        update: &StudentUpdate,
        class_name: &str,
    ) -> Result<bool> {
        let r = update_in_class(&mut self.conn, update, class_name);
        if let Ok(true) = r {
            info!(id = update.id, name = %update.name, class = class_name.trim(), "student updated");
        }
        self.track("update_student", r)
    }

    pub fn set_student_photo(&mut self, id: i64, photo: Option<&[u8]>) -> Result<bool> {
        let r = self
            .conn
            .execute(
                "UPDATE students SET photo = ? WHERE id = ?",
                rusqlite::params![photo, id],
            )
            .map(|n| n > 0)
            .map_err(RosterError::from);
        if let Ok(true) = r {
            info!(id, bytes = photo.map(|p| p.len()).unwrap_or(0), "student photo stored");
        }
        self.track("set_student_photo", r)
    }

    pub fn delete_student(&mut self, id: i64) -> Result<bool> {
        let r = self
            .conn
            .execute("DELETE FROM students WHERE id = ?", [id])
            .map(|n| n > 0)
            .map_err(RosterError::from);
        if let Ok(true) = r {
            info!(id, "student deleted");
        }
        self.track("delete_student", r)
    }

    pub fn student(&self, id: i64) -> Result<Option<StudentRecord>> {
        let sql = format!("{STUDENT_SELECT} WHERE s.id = ?");
        let rec = self
            .conn
            .query_row(&sql, [id], student_from_row)
            .optional()?;
        Ok(rec)
    }

    pub fn all_students(&self) -> Result<Vec<StudentRecord>> {
        self.query_students(&format!("{STUDENT_SELECT} ORDER BY s.name, s.id"), &[])
    }

    pub fn students_in_class(&self, class: ClassKey<'_>) -> Result<Vec<StudentRecord>> {
        let Some(class_id) = self.resolve_class(class)? else {
            return Ok(Vec::new());
        };
        self.query_students(
            &format!("{STUDENT_SELECT} WHERE s.class_id = ? ORDER BY s.name, s.id"),
            &[&class_id],
        )
    }

    /// Case-insensitive substring match on name or student id.
    pub fn search_students(&self, keyword: &str) -> Result<Vec<StudentRecord>> {
        let pattern = format!("%{}%", escape_like(keyword.trim()));
        self.query_students(
            &format!(
                "{STUDENT_SELECT}
                 WHERE s.name LIKE ?1 ESCAPE '\\' OR s.student_id LIKE ?1 ESCAPE '\\'
                 ORDER BY s.name, s.id"
            ),
            &[&pattern],
        )
    }

    pub fn random_student(&self, class: ClassKey<'_>) -> Result<Option<StudentRecord>> {
        self.random_student_with(class, &mut rand::thread_rng())
    }

    /// Loads the whole class and picks a uniform index into it.
    pub fn random_student_with<R: Rng>(
        &self,
        class: ClassKey<'_>,
        rng: &mut R,
    ) -> Result<Option<StudentRecord>> {
        let mut students = self.students_in_class(class)?;
        if students.is_empty() {
            return Ok(None);
        }
        let idx = rng.gen_range(0..students.len());
        let picked = students.swap_remove(idx);
        info!(id = picked.id, name = %picked.name, class = %picked.class_name, "random pick");
        Ok(Some(picked))
    }

    pub fn count_students(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?)
    }

    pub fn count_students_in_class(&self, class_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM students WHERE class_id = ?",
            [class_id],
            |r| r.get(0),
        )?)
    }

    /// Inserts the whole batch in one transaction. The first failing row
    /// rolls everything back, including classes created along the way.
    pub fn import_students(&mut self, batch: &[NewStudent]) -> Result<ImportOutcome> {
        let r = import_batch(&mut self.conn, batch);
        match &r {
            Ok(outcome) => info!(
                imported = outcome.imported,
                classes_created = outcome.classes_created.len(),
                "students imported"
            ),
            Err(_) => warn!(rows = batch.len(), "student import rolled back"),
        }
        self.track("import_students", r)
    }

    /// Removes every student; classes stay.
    pub fn clear_all_students(&mut self) -> Result<usize> {
        let r = self
            .conn
            .execute("DELETE FROM students", [])
            .map_err(RosterError::from);
        if let Ok(n) = &r {
            warn!(removed = n, "all students cleared");
        }
        self.track("clear_all_students", r)
    }

    fn resolve_class(&self, class: ClassKey<'_>) -> Result<Option<i64>> {
        match class {
            ClassKey::Id(id) => Ok(Some(id)),
            ClassKey::Name(name) => self.class_id(name),
        }
    }

    fn query_students(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<StudentRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, student_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn import_batch(conn: &mut Connection, batch: &[NewStudent]) -> Result<ImportOutcome> {
    let tx = conn.transaction()?;
    let mut outcome = ImportOutcome::default();
    for (i, student) in batch.iter().enumerate() {
        match insert_student(&tx, student) {
            Ok((_, created)) => {
                if created {
                    outcome.classes_created.push(student.class_name.trim().to_string());
                }
                outcome.imported += 1;
            }
            Err(e) => {
                // Dropping `tx` rolls the batch back.
                error!(row = i + 1, student_id = %student.student_id, error = %e, "import row failed");
                return Err(e);
            }
        }
    }
    tx.commit()?;
    Ok(outcome)
}

fn update_in_class(conn: &mut Connection, update: &StudentUpdate, class_name: &str) -> Result<bool> {
    validate_student_fields(&update.name, &update.student_id)?;
    let tx = conn.transaction()?;
    let (class_id, _) = ensure_class(&tx, class_name)?;
    let placed = StudentUpdate {
        class_id,
        ..update.clone()
    };
    let changed = apply_update(&tx, &placed)?;
    if changed {
        tx.commit()?;
    }
    Ok(changed)
}

fn apply_update(conn: &Connection, update: &StudentUpdate) -> Result<bool> {
    validate_student_fields(&update.name, &update.student_id)?;
    let n = conn.execute(
        "UPDATE students
         SET name = ?, student_id = ?, class_id = ?, photo = ?
         WHERE id = ?",
        rusqlite::params![
            update.name.trim(),
            update.student_id.trim(),
            update.class_id,
            update.photo,
            update.id
        ],
    )?;
    Ok(n > 0)
}

fn insert_class(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::InvalidInput("class name must not be empty".into()));
    }
    conn.execute("INSERT INTO classes(name) VALUES(?)", [name])?;
    Ok(conn.last_insert_rowid())
}

fn lookup_class_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM classes WHERE name = ?",
            [name.trim()],
            |r| r.get(0),
        )
        .optional()?)
}

/// Returns the class id and whether this call created it.
fn ensure_class(conn: &Connection, name: &str) -> Result<(i64, bool)> {
    match lookup_class_id(conn, name)? {
        Some(id) => Ok((id, false)),
        None => {
            let id = insert_class(conn, name)?;
            info!(id, name = name.trim(), "class created for student");
            Ok((id, true))
        }
    }
}

/// Ensure-class, then insert. Both statements run on `conn`, so inside an
/// import transaction they commit or roll back together.
fn insert_student(conn: &Connection, student: &NewStudent) -> Result<(i64, bool)> {
    validate_student_fields(&student.name, &student.student_id)?;
    let (class_id, created) = ensure_class(conn, &student.class_name)?;
    conn.execute(
        "INSERT INTO students(name, student_id, class_id, photo) VALUES(?, ?, ?, ?)",
        rusqlite::params![
            student.name.trim(),
            student.student_id.trim(),
            class_id,
            student.photo
        ],
    )?;
    Ok((conn.last_insert_rowid(), created))
}

fn validate_student_fields(name: &str, student_id: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RosterError::InvalidInput("student name must not be empty".into()));
    }
    if student_id.trim().is_empty() {
        return Err(RosterError::InvalidInput("student id must not be empty".into()));
    }
    Ok(())
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        student_id: row.get(2)?,
        class_id: row.get(3)?,
        class_name: row.get(4)?,
        photo: row.get(5)?,
        created_at: parse_timestamp(row.get(6)?),
    })
}

fn parse_timestamp(raw: Option<String>) -> Option<NaiveDateTime> {
    raw.and_then(|s| NaiveDateTime::parse_from_str(&s, SQLITE_TIMESTAMP).ok())
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("10%_a\\b"), "10\\%\\_a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn sqlite_timestamps_parse() {
        let ts = parse_timestamp(Some("2024-09-01 08:30:00".into())).unwrap();
        assert_eq!(ts.format("%H:%M").to_string(), "08:30");
        assert!(parse_timestamp(Some("not a date".into())).is_none());
        assert!(parse_timestamp(None).is_none());
    }
}
