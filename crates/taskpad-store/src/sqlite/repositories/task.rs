//! Task repository — CRUD for the `tasks` table.
//!
//! Every query and mutation is scoped by `user_id`; listing queries order
//! by `timestamp DESC` (newest first). Insert is upsert-by-id: a task with
//! `id == 0` gets a fresh rowid, re-inserting an existing id replaces the
//! row instead of duplicating it.

use rusqlite::{Connection, OptionalExtension, params};

use taskpad_core::ids::UserId;
use taskpad_core::task::{Priority, Task, TaskSummary};

use crate::errors::Result;

/// Task repository — stateless, every method takes `&Connection`.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task (upsert-by-id).
    ///
    /// Returns the stored row with its assigned id.
    pub fn insert(conn: &Connection, task: &Task) -> Result<Task> {
        let mut stored = task.clone();
        if task.id == 0 {
            let _ = conn.execute(
                "INSERT INTO tasks (title, priority, timestamp, is_completed, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    task.title,
                    task.priority.as_sql(),
                    task.timestamp,
                    task.is_completed,
                    task.user_id.as_str(),
                ],
            )?;
            stored.id = conn.last_insert_rowid();
        } else {
            let _ = conn.execute(
                "INSERT OR REPLACE INTO tasks (id, title, priority, timestamp, is_completed, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    task.id,
                    task.title,
                    task.priority.as_sql(),
                    task.timestamp,
                    task.is_completed,
                    task.user_id.as_str(),
                ],
            )?;
        }
        Ok(stored)
    }

    /// Replace the row matching `task.id`.
    ///
    /// Returns `false` (not an error) if no such row exists — callers only
    /// update rows they hold a vended snapshot of, so a missing row means
    /// it was deleted in the meantime and must stay deleted.
    pub fn update(conn: &Connection, task: &Task) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE tasks
             SET title = ?1, priority = ?2, timestamp = ?3, is_completed = ?4, user_id = ?5
             WHERE id = ?6",
            params![
                task.title,
                task.priority.as_sql(),
                task.timestamp,
                task.is_completed,
                task.user_id.as_str(),
                task.id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete the row matching `id`. Returns `false` if absent.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Delete every row belonging to `user_id`. Returns the removed count.
    pub fn delete_all_for_user(conn: &Connection, user_id: &UserId) -> Result<usize> {
        let changed = conn.execute(
            "DELETE FROM tasks WHERE user_id = ?1",
            params![user_id.as_str()],
        )?;
        Ok(changed)
    }

    /// Get a task by id.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let row = conn
            .query_row(
                "SELECT id, title, priority, timestamp, is_completed, user_id
                 FROM tasks WHERE id = ?1",
                params![id],
                Self::map_task,
            )
            .optional()?;
        Ok(row)
    }

    /// All tasks for a user, newest first.
    pub fn list_all(conn: &Connection, user_id: &UserId) -> Result<Vec<Task>> {
        Self::list_where(conn, user_id, None)
    }

    /// Open tasks for a user, newest first.
    pub fn list_active(conn: &Connection, user_id: &UserId) -> Result<Vec<Task>> {
        Self::list_where(conn, user_id, Some(false))
    }

    /// Completed tasks for a user, newest first.
    pub fn list_completed(conn: &Connection, user_id: &UserId) -> Result<Vec<Task>> {
        Self::list_where(conn, user_id, Some(true))
    }

    /// Per-user task counts in a single scan.
    pub fn count_summary(conn: &Connection, user_id: &UserId) -> Result<TaskSummary> {
        let summary = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(is_completed), 0)
             FROM tasks WHERE user_id = ?1",
            params![user_id.as_str()],
            |row| {
                let total: i64 = row.get(0)?;
                let completed: i64 = row.get(1)?;
                Ok(TaskSummary {
                    total,
                    completed,
                    pending: total - completed,
                })
            },
        )?;
        Ok(summary)
    }

    fn list_where(
        conn: &Connection,
        user_id: &UserId,
        completed: Option<bool>,
    ) -> Result<Vec<Task>> {
        let sql = match completed {
            None => {
                "SELECT id, title, priority, timestamp, is_completed, user_id
                 FROM tasks WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC"
            }
            Some(false) => {
                "SELECT id, title, priority, timestamp, is_completed, user_id
                 FROM tasks WHERE user_id = ?1 AND is_completed = 0
                 ORDER BY timestamp DESC, id DESC"
            }
            Some(true) => {
                "SELECT id, title, priority, timestamp, is_completed, user_id
                 FROM tasks WHERE user_id = ?1 AND is_completed = 1
                 ORDER BY timestamp DESC, id DESC"
            }
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![user_id.as_str()], Self::map_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let priority_raw: String = row.get(2)?;
        let priority = Priority::from_sql(&priority_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown priority: {priority_raw}").into(),
            )
        })?;
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            priority,
            timestamp: row.get(3)?,
            is_completed: row.get(4)?,
            user_id: UserId::new(row.get::<_, String>(5)?),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::connection::open_in_memory;

    fn setup() -> Connection {
        open_in_memory().unwrap()
    }

    fn make_task(title: &str, user: &str, timestamp: i64) -> Task {
        Task {
            id: 0,
            title: title.to_string(),
            priority: Priority::Medium,
            timestamp,
            is_completed: false,
            user_id: UserId::new(user),
        }
    }

    #[test]
    fn insert_assigns_id() {
        let conn = setup();
        let stored = TaskRepo::insert(&conn, &make_task("Buy milk", "user_1", 100)).unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.title, "Buy milk");
    }

    #[test]
    fn insert_then_get_round_trips_all_fields() {
        let conn = setup();
        let mut task = make_task("Buy milk", "user_1", 100);
        task.priority = Priority::High;
        let stored = TaskRepo::insert(&conn, &task).unwrap();

        let fetched = TaskRepo::get_by_id(&conn, stored.id).unwrap().unwrap();
        assert_eq!(fetched, stored);
        // Everything except the assigned id matches what went in
        assert_eq!(fetched.title, task.title);
        assert_eq!(fetched.priority, task.priority);
        assert_eq!(fetched.timestamp, task.timestamp);
        assert_eq!(fetched.is_completed, task.is_completed);
        assert_eq!(fetched.user_id, task.user_id);
    }

    #[test]
    fn reinsert_same_id_replaces_not_duplicates() {
        let conn = setup();
        let stored = TaskRepo::insert(&conn, &make_task("Old title", "user_1", 100)).unwrap();

        let mut replacement = stored.clone();
        replacement.title = "New title".to_string();
        TaskRepo::insert(&conn, &replacement).unwrap();

        let all = TaskRepo::list_all(&conn, &UserId::new("user_1")).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New title");
        assert_eq!(all[0].id, stored.id);
    }

    #[test]
    fn update_replaces_row() {
        let conn = setup();
        let stored = TaskRepo::insert(&conn, &make_task("Walk dog", "user_1", 100)).unwrap();
        let toggled = stored.toggled();

        let changed = TaskRepo::update(&conn, &toggled).unwrap();
        assert!(changed);

        let fetched = TaskRepo::get_by_id(&conn, stored.id).unwrap().unwrap();
        assert!(fetched.is_completed);
    }

    #[test]
    fn update_missing_row_is_noop() {
        let conn = setup();
        let mut ghost = make_task("Ghost", "user_1", 100);
        ghost.id = 999;
        let changed = TaskRepo::update(&conn, &ghost).unwrap();
        assert!(!changed);
        assert!(TaskRepo::get_by_id(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn delete_removes_row() {
        let conn = setup();
        let stored = TaskRepo::insert(&conn, &make_task("Walk dog", "user_1", 100)).unwrap();
        assert!(TaskRepo::delete(&conn, stored.id).unwrap());
        assert!(TaskRepo::get_by_id(&conn, stored.id).unwrap().is_none());
    }

    #[test]
    fn delete_missing_row_is_noop() {
        let conn = setup();
        TaskRepo::insert(&conn, &make_task("Keep me", "user_1", 100)).unwrap();
        assert!(!TaskRepo::delete(&conn, 999).unwrap());
        assert_eq!(TaskRepo::list_all(&conn, &UserId::new("user_1")).unwrap().len(), 1);
    }

    #[test]
    fn list_orders_newest_first() {
        let conn = setup();
        TaskRepo::insert(&conn, &make_task("first", "user_1", 100)).unwrap();
        TaskRepo::insert(&conn, &make_task("third", "user_1", 300)).unwrap();
        TaskRepo::insert(&conn, &make_task("second", "user_1", 200)).unwrap();

        let all = TaskRepo::list_all(&conn, &UserId::new("user_1")).unwrap();
        let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[test]
    fn list_never_leaks_other_users() {
        let conn = setup();
        TaskRepo::insert(&conn, &make_task("mine", "user_1", 100)).unwrap();
        TaskRepo::insert(&conn, &make_task("theirs", "user_2", 200)).unwrap();

        let mine = TaskRepo::list_all(&conn, &UserId::new("user_1")).unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|t| t.user_id.as_str() == "user_1"));
    }

    #[test]
    fn active_and_completed_partition_all() {
        let conn = setup();
        let user = UserId::new("user_1");
        let open = TaskRepo::insert(&conn, &make_task("open", "user_1", 100)).unwrap();
        let done = TaskRepo::insert(&conn, &make_task("done", "user_1", 200)).unwrap();
        TaskRepo::update(&conn, &done.toggled()).unwrap();

        let all = TaskRepo::list_all(&conn, &user).unwrap();
        let active = TaskRepo::list_active(&conn, &user).unwrap();
        let completed = TaskRepo::list_completed(&conn, &user).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, done.id);

        let mut ids: Vec<i64> = active.iter().chain(&completed).map(|t| t.id).collect();
        ids.sort_unstable();
        let mut all_ids: Vec<i64> = all.iter().map(|t| t.id).collect();
        all_ids.sort_unstable();
        assert_eq!(ids, all_ids);
    }

    #[test]
    fn delete_all_for_user_leaves_others_untouched() {
        let conn = setup();
        TaskRepo::insert(&conn, &make_task("a", "user_1", 100)).unwrap();
        TaskRepo::insert(&conn, &make_task("b", "user_1", 200)).unwrap();
        TaskRepo::insert(&conn, &make_task("c", "user_2", 300)).unwrap();

        let removed = TaskRepo::delete_all_for_user(&conn, &UserId::new("user_1")).unwrap();
        assert_eq!(removed, 2);
        assert!(TaskRepo::list_all(&conn, &UserId::new("user_1")).unwrap().is_empty());
        assert_eq!(TaskRepo::list_all(&conn, &UserId::new("user_2")).unwrap().len(), 1);
    }

    #[test]
    fn count_summary_counts() {
        let conn = setup();
        let user = UserId::new("user_1");
        TaskRepo::insert(&conn, &make_task("a", "user_1", 100)).unwrap();
        let b = TaskRepo::insert(&conn, &make_task("b", "user_1", 200)).unwrap();
        TaskRepo::update(&conn, &b.toggled()).unwrap();
        TaskRepo::insert(&conn, &make_task("other", "user_2", 300)).unwrap();

        let summary = TaskRepo::count_summary(&conn, &user).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 1);
    }

    #[test]
    fn count_summary_empty_user() {
        let conn = setup();
        let summary = TaskRepo::count_summary(&conn, &UserId::new("user_none")).unwrap();
        assert_eq!(summary, TaskSummary::default());
    }
}
