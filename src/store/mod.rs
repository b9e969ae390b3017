//! Persistent project store backed by SQLite.
//!
//! All state the user edits in the UI (projects, selections, categories and
//! their assignments) lives here and is written through immediately; there is
//! no in-memory-only staging. Referential integrity between selections and
//! categories is enforced at this boundary, not by callers.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Default AI prompt guide for new projects.
pub const DEFAULT_PROMPT_GUIDE: &str = "[2-4 Sentence description of this project goes here]
I need your help with the following task progressing this project forwards. When providing code changes, please output the complete content of any modified files in their entirety. Do not provide only snippets or diffs; I need the full file content to easily replace my existing files.
My question is:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A project named '{0}' already exists")]
    ProjectNameTaken(String),

    #[error("Category '{0}' already exists for this project")]
    CategoryNameTaken(String),

    #[error("No selection with id {0}")]
    UnknownSelection(i64),

    #[error("Category {0} does not belong to the selection's project")]
    ForeignCategory(i64),
}

/// A curated project: a named root directory plus its prompt guide.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub root_path: PathBuf,
    pub prompt_guide: String,
}

/// A user-defined label grouping selections for filtered export.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    File,
    Directory,
}

/// A user-chosen file or directory slated for context export.
///
/// Directory selections carry a filter set controlling which files beneath
/// them are included; file selections are included verbatim. `categories`
/// holds the ids of all categories assigned to this selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: i64,
    pub project_id: i64,
    pub path: PathBuf,
    pub kind: SelectionKind,
    pub extension_filters: Vec<String>,
    pub categories: Vec<i64>,
}

/// SQLite-backed store for projects, selections and categories.
///
/// The connection is opened once at startup and shared behind a mutex;
/// writes are short per-edit transactions (single-user desktop app, no
/// concurrent writers).
pub struct ProjectStore {
    conn: Mutex<Connection>,
}

impl ProjectStore {
    /// Opens (or creates) the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                root_path TEXT NOT NULL,
                prompt_guide TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                UNIQUE (project_id, name)
            );

            CREATE TABLE IF NOT EXISTS selections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                path TEXT NOT NULL,
                is_directory INTEGER NOT NULL,
                extension_filters TEXT,
                UNIQUE (project_id, path)
            );

            CREATE TABLE IF NOT EXISTS selection_categories (
                selection_id INTEGER NOT NULL REFERENCES selections(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                PRIMARY KEY (selection_id, category_id)
            );

            CREATE INDEX IF NOT EXISTS idx_selections_project ON selections(project_id);
            CREATE INDEX IF NOT EXISTS idx_selection_categories_category
                ON selection_categories(category_id);

            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    // --- Projects ---

    /// Adds a new project. Project names are unique across the store.
    pub fn add_project(
        &self,
        name: &str,
        root_path: &Path,
        prompt_guide: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO projects (name, root_path, prompt_guide) VALUES (?1, ?2, ?3)",
            params![name, path_to_db(root_path), prompt_guide],
        );
        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::ProjectNameTaken(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns all projects ordered by name.
    pub fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, root_path, prompt_guide FROM projects ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let project = conn
            .query_row(
                "SELECT id, name, root_path, prompt_guide FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()?;
        Ok(project)
    }

    /// Returns the project flagged as active, if any.
    pub fn active_project(&self) -> Result<Option<Project>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let project = conn
            .query_row(
                "SELECT id, name, root_path, prompt_guide FROM projects WHERE is_active = 1",
                [],
                row_to_project,
            )
            .optional()?;
        Ok(project)
    }

    /// Marks the given project as active (or none).
    pub fn set_active_project(&self, id: Option<i64>) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("UPDATE projects SET is_active = 0", [])?;
        if let Some(id) = id {
            tx.execute("UPDATE projects SET is_active = 1 WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn update_prompt_guide(&self, id: i64, prompt_guide: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE projects SET prompt_guide = ?1 WHERE id = ?2",
            params![prompt_guide, id],
        )?;
        Ok(())
    }

    /// Deletes a project. Its selections, categories and category
    /// assignments are removed with it (foreign-key cascade).
    pub fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(())
    }

    // --- Categories ---

    pub fn add_category(&self, project_id: i64, name: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO categories (project_id, name) VALUES (?1, ?2)",
            params![project_id, name],
        );
        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::CategoryNameTaken(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn categories(&self, project_id: i64) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name FROM categories WHERE project_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                project_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Removes a category. Selections tagged with it become uncategorized;
    /// they are not deleted.
    pub fn remove_category(&self, category_id: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM selection_categories WHERE category_id = ?1",
            params![category_id],
        )?;
        tx.execute("DELETE FROM categories WHERE id = ?1", params![category_id])?;
        tx.commit()?;
        Ok(())
    }

    // --- Selections ---

    /// Inserts a selection, or updates kind and filters in place if the
    /// path is already selected for this project. Category assignments of
    /// an existing selection are preserved.
    pub fn upsert_selection(
        &self,
        project_id: i64,
        path: &Path,
        kind: SelectionKind,
        extension_filters: &[String],
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let is_directory = matches!(kind, SelectionKind::Directory);
        let filters = if is_directory {
            Some(extension_filters.join(","))
        } else {
            None
        };
        conn.execute(
            "INSERT INTO selections (project_id, path, is_directory, extension_filters)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (project_id, path) DO UPDATE
             SET is_directory = excluded.is_directory,
                 extension_filters = excluded.extension_filters",
            params![project_id, path_to_db(path), is_directory, filters],
        )?;
        let id = conn.query_row(
            "SELECT id FROM selections WHERE project_id = ?1 AND path = ?2",
            params![project_id, path_to_db(path)],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Returns a project's selections ordered by path, with their category
    /// assignments. With a category filter only selections carrying that
    /// category are returned.
    pub fn selections(
        &self,
        project_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Selection>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut selections = match category_id {
            Some(category_id) => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT s.id, s.project_id, s.path, s.is_directory, s.extension_filters
                     FROM selections s
                     JOIN selection_categories sc ON sc.selection_id = s.id
                     WHERE s.project_id = ?1 AND sc.category_id = ?2
                     ORDER BY s.path",
                )?;
                let rows = stmt.query_map(params![project_id, category_id], row_to_selection)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, project_id, path, is_directory, extension_filters
                     FROM selections WHERE project_id = ?1 ORDER BY path",
                )?;
                let rows = stmt.query_map(params![project_id], row_to_selection)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        for selection in &mut selections {
            selection.categories = selection_category_ids(&conn, selection.id)?;
        }
        Ok(selections)
    }

    pub fn selection_by_path(
        &self,
        project_id: i64,
        path: &Path,
    ) -> Result<Option<Selection>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let selection = conn
            .query_row(
                "SELECT id, project_id, path, is_directory, extension_filters
                 FROM selections WHERE project_id = ?1 AND path = ?2",
                params![project_id, path_to_db(path)],
                row_to_selection,
            )
            .optional()?;
        match selection {
            Some(mut selection) => {
                selection.categories = selection_category_ids(&conn, selection.id)?;
                Ok(Some(selection))
            }
            None => Ok(None),
        }
    }

    pub fn remove_selection(&self, project_id: i64, path: &Path) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM selections WHERE project_id = ?1 AND path = ?2",
            params![project_id, path_to_db(path)],
        )?;
        Ok(())
    }

    /// Replaces the category assignments of a selection.
    ///
    /// Every category must belong to the selection's project; a mismatch
    /// fails the whole update without partial writes.
    pub fn set_selection_categories(
        &self,
        selection_id: i64,
        category_ids: &[i64],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let project_id: i64 = tx
            .query_row(
                "SELECT project_id FROM selections WHERE id = ?1",
                params![selection_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownSelection(selection_id))?;

        for &category_id in category_ids {
            let owner: Option<i64> = tx
                .query_row(
                    "SELECT project_id FROM categories WHERE id = ?1",
                    params![category_id],
                    |row| row.get(0),
                )
                .optional()?;
            if owner != Some(project_id) {
                return Err(StoreError::ForeignCategory(category_id));
            }
        }

        tx.execute(
            "DELETE FROM selection_categories WHERE selection_id = ?1",
            params![selection_id],
        )?;
        for &category_id in category_ids {
            tx.execute(
                "INSERT INTO selection_categories (selection_id, category_id) VALUES (?1, ?2)",
                params![selection_id, category_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- App settings ---

    pub fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn path_to_db(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        root_path: PathBuf::from(row.get::<_, String>(2)?),
        prompt_guide: row.get(3)?,
    })
}

fn row_to_selection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Selection> {
    let is_directory: bool = row.get(3)?;
    let filters: Option<String> = row.get(4)?;
    Ok(Selection {
        id: row.get(0)?,
        project_id: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        kind: if is_directory {
            SelectionKind::Directory
        } else {
            SelectionKind::File
        },
        extension_filters: filters
            .map(|f| {
                f.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        categories: Vec::new(),
    })
}

fn selection_category_ids(
    conn: &Connection,
    selection_id: i64,
) -> Result<Vec<i64>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT category_id FROM selection_categories WHERE selection_id = ?1 ORDER BY category_id",
    )?;
    let rows = stmt.query_map(params![selection_id], |row| row.get(0))?;
    rows.collect()
}
