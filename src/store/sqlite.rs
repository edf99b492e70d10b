//! SQLite-backed store.
//!
//! A single connection behind a mutex serializes all writes, and settlement
//! runs inside one transaction: the status flip and every per-assignee
//! `points = points + ?` increment commit together or roll back together.

use super::{Store, StoreError, TaskPatch};
use crate::family::{self, Family, User};
use crate::scoring::{Difficulty, Duration, Priority};
use crate::task::{parse_date, parse_time, Task, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    family_id TEXT
);

CREATE TABLE IF NOT EXISTS families (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    invite_code TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    family_id TEXT NOT NULL,
    created_by TEXT NOT NULL,
    title TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT,
    difficulty TEXT NOT NULL,
    duration TEXT NOT NULL,
    points INTEGER NOT NULL,
    priority TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    completed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_family ON tasks(family_id);
CREATE INDEX IF NOT EXISTS idx_tasks_family_date ON tasks(family_id, date);
CREATE INDEX IF NOT EXISTS idx_tasks_family_status ON tasks(family_id, status);

CREATE TABLE IF NOT EXISTS task_assignees (
    task_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    PRIMARY KEY (task_id, user_id),
    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_assignees_user ON task_assignees(user_id);
"#;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, handy for throwaway environments.
    pub fn open_ephemeral() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Raw column values before enum/date parsing.
struct TaskRow {
    id: String,
    family_id: String,
    created_by: String,
    title: String,
    date: String,
    time: Option<String>,
    difficulty: String,
    duration: String,
    points: i64,
    priority: String,
    status: String,
    completed_at: Option<String>,
    created_at: String,
}

const TASK_COLUMNS: &str = "id, family_id, created_by, title, date, time, difficulty, duration, \
     points, priority, status, completed_at, created_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        family_id: row.get(1)?,
        created_by: row.get(2)?,
        title: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        difficulty: row.get(6)?,
        duration: row.get(7)?,
        points: row.get(8)?,
        priority: row.get(9)?,
        status: row.get(10)?,
        completed_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("corrupt task row: bad {what} {value:?}"))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|_| corrupt("uuid", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| corrupt("timestamp", s))
}

impl TaskRow {
    fn into_task(self, assignees: Vec<Uuid>) -> Result<Task, StoreError> {
        Ok(Task {
            id: parse_uuid(&self.id)?,
            family_id: parse_uuid(&self.family_id)?,
            created_by: parse_uuid(&self.created_by)?,
            title: self.title,
            date: parse_date(&self.date).map_err(|_| corrupt("date", &self.date))?,
            time: self
                .time
                .as_deref()
                .map(|t| parse_time(t).map_err(|_| corrupt("time", t)))
                .transpose()?,
            difficulty: Difficulty::parse(&self.difficulty)
                .ok_or_else(|| corrupt("difficulty", &self.difficulty))?,
            duration: Duration::parse(&self.duration)
                .ok_or_else(|| corrupt("duration", &self.duration))?,
            points: self.points,
            priority: Priority::parse(&self.priority)
                .ok_or_else(|| corrupt("priority", &self.priority))?,
            status: TaskStatus::parse(&self.status)
                .ok_or_else(|| corrupt("status", &self.status))?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            assignees,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn load_assignees(conn: &Connection, task_id: &str) -> Result<Vec<Uuid>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id")?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    ids.iter().map(|s| parse_uuid(s)).collect()
}

fn load_task(conn: &Connection, family_id: Uuid, id: Uuid) -> Result<Task, StoreError> {
    let raw = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND family_id = ?2"),
            params![id.to_string(), family_id.to_string()],
            row_to_raw,
        )
        .optional()?
        .ok_or(StoreError::TaskNotFound)?;
    let assignees = load_assignees(conn, &raw.id)?;
    raw.into_task(assignees)
}

fn load_user(conn: &Connection, id: Uuid) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            "SELECT id, name, points, streak, family_id FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;
    user.map(|(id, name, points, streak, family_id)| {
        Ok(User {
            id: parse_uuid(&id)?,
            name,
            points,
            streak,
            family_id: family_id.as_deref().map(parse_uuid).transpose()?,
        })
    })
    .transpose()
}

#[async_trait]
impl Store for SqliteStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_user(&self, name: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points: 0,
            streak: 0,
            family_id: None,
        };
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, name, points, streak, family_id) VALUES (?1, ?2, 0, 0, NULL)",
            params![user.id.to_string(), user.name],
        )?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().await;
        load_user(&conn, id)
    }

    async fn create_family(&self, name: &str, creator: Uuid) -> Result<Family, StoreError> {
        let family = Family {
            id: Uuid::new_v4(),
            name: name.to_string(),
            invite_code: family::generate_invite_code(name),
        };
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        if load_user(&tx, creator)?.is_none() {
            return Err(StoreError::UserNotFound);
        }
        tx.execute(
            "INSERT INTO families (id, name, invite_code) VALUES (?1, ?2, ?3)",
            params![family.id.to_string(), family.name, family.invite_code],
        )?;
        tx.execute(
            "UPDATE users SET family_id = ?1 WHERE id = ?2",
            params![family.id.to_string(), creator.to_string()],
        )?;
        tx.commit()?;
        Ok(family)
    }

    async fn join_family(&self, invite_code: &str, user_id: Uuid) -> Result<Family, StoreError> {
        let code = invite_code.trim().to_uppercase();
        let conn = self.conn.lock().await;
        let family = conn
            .query_row(
                "SELECT id, name, invite_code FROM families WHERE invite_code = ?1",
                params![code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?
            .ok_or(StoreError::BadInviteCode)?;
        let updated = conn.execute(
            "UPDATE users SET family_id = ?1 WHERE id = ?2",
            params![family.0, user_id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(Family {
            id: parse_uuid(&family.0)?,
            name: family.1,
            invite_code: family.2,
        })
    }

    async fn get_family(&self, id: Uuid) -> Result<Option<Family>, StoreError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, invite_code FROM families WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?
        .map(|(id, name, invite_code)| {
            Ok(Family {
                id: parse_uuid(&id)?,
                name,
                invite_code,
            })
        })
        .transpose()
    }

    async fn family_members(&self, family_id: Uuid) -> Result<Vec<User>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, points, streak, family_id FROM users \
             WHERE family_id = ?1 ORDER BY points DESC, name ASC",
        )?;
        let rows = stmt
            .query_map(params![family_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(id, name, points, streak, family_id)| {
                Ok(User {
                    id: parse_uuid(&id)?,
                    name,
                    points,
                    streak,
                    family_id: family_id.as_deref().map(parse_uuid).transpose()?,
                })
            })
            .collect()
    }

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO tasks (id, family_id, created_by, title, date, time, difficulty, \
             duration, points, priority, status, completed_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12)",
            params![
                task.id.to_string(),
                task.family_id.to_string(),
                task.created_by.to_string(),
                task.title,
                task.date.format("%Y-%m-%d").to_string(),
                task.time.map(|t| t.format("%H:%M").to_string()),
                task.difficulty.as_str(),
                task.duration.as_str(),
                task.points,
                task.priority.as_str(),
                task.status.as_str(),
                task.created_at.to_rfc3339(),
            ],
        )?;
        for assignee in &task.assignees {
            tx.execute(
                "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
                params![task.id.to_string(), assignee.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(task)
    }

    async fn get_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError> {
        let conn = self.conn.lock().await;
        load_task(&conn, family_id, id)
    }

    async fn list_tasks(&self, family_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock().await;
        // rowid order preserves creation order for the stable tie-break.
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE family_id = ?1 ORDER BY rowid"
        ))?;
        let raws = stmt
            .query_map(params![family_id.to_string()], row_to_raw)?
            .collect::<rusqlite::Result<Vec<TaskRow>>>()?;
        raws.into_iter()
            .map(|raw| {
                let assignees = load_assignees(&conn, &raw.id)?;
                raw.into_task(assignees)
            })
            .collect()
    }

    async fn all_pending_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status = 'PENDING' ORDER BY rowid"
        ))?;
        let raws = stmt
            .query_map([], row_to_raw)?
            .collect::<rusqlite::Result<Vec<TaskRow>>>()?;
        raws.into_iter()
            .map(|raw| {
                let assignees = load_assignees(&conn, &raw.id)?;
                raw.into_task(assignees)
            })
            .collect()
    }

    async fn update_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, StoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let task = load_task(&tx, family_id, id)?;
        if let Some(ref title) = patch.title {
            tx.execute(
                "UPDATE tasks SET title = ?1 WHERE id = ?2",
                params![title, id.to_string()],
            )?;
        }
        if let Some(date) = patch.date {
            tx.execute(
                "UPDATE tasks SET date = ?1 WHERE id = ?2",
                params![date.format("%Y-%m-%d").to_string(), id.to_string()],
            )?;
        }
        if let Some(time) = patch.time {
            tx.execute(
                "UPDATE tasks SET time = ?1 WHERE id = ?2",
                params![time.map(|t| t.format("%H:%M").to_string()), id.to_string()],
            )?;
        }
        tx.commit()?;
        let mut task = task;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(date) = patch.date {
            task.date = date;
        }
        if let Some(time) = patch.time {
            task.time = time;
        }
        Ok(task)
    }

    async fn replace_assignees(
        &self,
        family_id: Uuid,
        id: Uuid,
        mut assignee_ids: Vec<Uuid>,
    ) -> Result<Task, StoreError> {
        assignee_ids.sort();
        assignee_ids.dedup();
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut task = load_task(&tx, family_id, id)?;
        tx.execute(
            "DELETE FROM task_assignees WHERE task_id = ?1",
            params![id.to_string()],
        )?;
        for assignee in &assignee_ids {
            tx.execute(
                "INSERT INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
                params![id.to_string(), assignee.to_string()],
            )?;
        }
        tx.commit()?;
        task.assignees = assignee_ids;
        Ok(task)
    }

    async fn complete_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut task = load_task(&tx, family_id, id)?;
        if task.status == TaskStatus::Completed {
            return Ok(task);
        }
        tx.execute(
            "UPDATE tasks SET status = 'COMPLETED', completed_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id.to_string()],
        )?;
        let share = task.per_assignee_share();
        for assignee in &task.assignees {
            tx.execute(
                "UPDATE users SET points = points + ?1 WHERE id = ?2",
                params![share, assignee.to_string()],
            )?;
        }
        tx.commit()?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);
        Ok(task)
    }

    async fn uncomplete_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut task = load_task(&tx, family_id, id)?;
        if task.status == TaskStatus::Pending {
            return Ok(task);
        }
        tx.execute(
            "UPDATE tasks SET status = 'PENDING', completed_at = NULL WHERE id = ?1",
            params![id.to_string()],
        )?;
        let share = task.per_assignee_share();
        for assignee in &task.assignees {
            tx.execute(
                "UPDATE users SET points = points - ?1 WHERE id = ?2",
                params![share, assignee.to_string()],
            )?;
        }
        tx.commit()?;
        task.status = TaskStatus::Pending;
        task.completed_at = None;
        Ok(task)
    }

    async fn delete_task(&self, family_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND family_id = ?2",
            params![id.to_string(), family_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(StoreError::TaskNotFound);
        }
        Ok(())
    }

    async fn completed_tasks_for_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        limit: usize,
    ) -> Result<(Vec<Task>, usize), StoreError> {
        let conn = self.conn.lock().await;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks t \
             JOIN task_assignees a ON a.task_id = t.id \
             WHERE t.family_id = ?1 AND a.user_id = ?2 AND t.status = 'COMPLETED'",
            params![family_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t \
             JOIN task_assignees a ON a.task_id = t.id \
             WHERE t.family_id = ?1 AND a.user_id = ?2 AND t.status = 'COMPLETED' \
             ORDER BY t.completed_at DESC LIMIT ?3"
        ))?;
        let raws = stmt
            .query_map(
                params![family_id.to_string(), user_id.to_string(), limit as i64],
                row_to_raw,
            )?
            .collect::<rusqlite::Result<Vec<TaskRow>>>()?;
        let tasks = raws
            .into_iter()
            .map(|raw| {
                let assignees = load_assignees(&conn, &raw.id)?;
                raw.into_task(assignees)
            })
            .collect::<Result<Vec<Task>, StoreError>>()?;
        Ok((tasks, total as usize))
    }
}
