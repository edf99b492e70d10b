//! Date-windowed task queries for the calendar view and the board.
//!
//! Pure helpers over task slices; every store backend funnels its listings
//! through these so the ordering rules live in exactly one place.

use chrono::NaiveDate;

use crate::task::{Task, TaskStatus};

/// Order tasks for the family board: date ascending, then priority
/// descending (URGENT first). The sort is stable, so tasks on the same
/// date with equal priority keep their creation order.
pub fn sort_for_board(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
    });
}

/// All tasks due on an exact calendar date, any status. The calendar view
/// shows a full day's agenda including already-completed items.
pub fn tasks_for_date(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    tasks.iter().filter(|t| t.date == date).cloned().collect()
}

/// Pending tasks only, in board order.
pub fn pending_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut pending: Vec<Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .cloned()
        .collect();
    sort_for_board(&mut pending);
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::Utc;
    use uuid::Uuid;

    fn task(title: &str, date: &str, difficulty: &str) -> Task {
        NewTask::parse(title, date, None, difficulty, "15", vec![])
            .unwrap()
            .into_task(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn board_orders_by_date_then_priority() {
        // epic -> URGENT, easy -> LOW, hard -> HIGH
        let tasks = vec![
            task("later urgent", "2024-06-02", "epic"),
            task("early low", "2024-06-01", "easy"),
            task("early high", "2024-06-01", "hard"),
        ];
        let ordered = pending_tasks(&tasks);
        let titles: Vec<&str> = ordered.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["early high", "early low", "later urgent"]);
    }

    #[test]
    fn board_tie_break_is_creation_order() {
        let first = task("first", "2024-06-01", "normal");
        let second = task("second", "2024-06-01", "normal");
        let ordered = pending_tasks(&[first, second]);
        assert_eq!(ordered[0].title, "first");
        assert_eq!(ordered[1].title, "second");
    }

    #[test]
    fn pending_excludes_completed() {
        let mut done = task("done", "2024-06-01", "easy");
        done.status = TaskStatus::Completed;
        done.completed_at = Some(Utc::now());
        let open = task("open", "2024-06-01", "easy");
        let ordered = pending_tasks(&[done, open]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].title, "open");
    }

    #[test]
    fn date_query_matches_exact_day_any_status() {
        let mut done = task("done", "2024-06-01", "easy");
        done.status = TaskStatus::Completed;
        done.completed_at = Some(Utc::now());
        let other_day = task("tomorrow", "2024-06-02", "easy");
        let day = tasks_for_date(
            &[done, other_day],
            crate::task::parse_date("2024-06-01").unwrap(),
        );
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].title, "done");
    }
}
