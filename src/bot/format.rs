use chrono::Utc;

use crate::models::{Sprint, Task, User};

pub fn task_line(task: &Task) -> String {
    let mut line = format!("#{} [{}] {}", task.id, task.status, task.description);
    if let Some(estimate) = task.estimate_hours {
        line.push_str(&format!(" ({}h est.)", estimate));
    }
    if let Some(sprint_id) = task.sprint_id {
        line.push_str(&format!(" · sprint {}", sprint_id));
    }
    if let Some(category) = &task.category {
        line.push_str(&format!(" · {}", category));
    }
    line
}

/// Open tasks first, then done ones, each group by id.
pub fn task_list(title: &str, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return format!("{}\nNo tasks.", title);
    }
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| (t.is_done(), t.id));

    let mut text = title.to_string();
    for task in sorted {
        text.push('\n');
        text.push_str(&task_line(task));
    }
    text.push_str("\n\nReply with <id>-START, <id>-DONE, <id>-UNDO or <id>-DELETE.");
    text
}

pub fn sprint_list(sprints: &[Sprint]) -> String {
    if sprints.is_empty() {
        return "No sprints in this project yet.".to_string();
    }
    let now = Utc::now();
    let mut text = String::from("Sprints:");
    for sprint in sprints {
        text.push_str(&format!("\n#{} {}", sprint.id, sprint.name));
        if let (Some(start), Some(end)) = (sprint.start_time, sprint.end_time) {
            text.push_str(&format!(" ({} → {})", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")));
        }
        if sprint.is_active(now) {
            text.push_str(" · active");
        }
    }
    text
}

pub fn pending_user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No pending users.".to_string();
    }
    let mut text = String::from("Pending users:");
    for user in users {
        text.push_str(&format!("\n#{} {}", user.id, user.full_name()));
    }
    text.push_str("\n\nUse /approve <id> [developer|manager] or /reject <id>.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, NewUser};

    fn task(id: i64, status: &str) -> Task {
        let mut t = Task::from_new(id, Utc::now(), NewTask::from_chat(1, 1, &format!("task {}", id)));
        t.status = status.to_string();
        t
    }

    #[test]
    fn line_includes_optional_fields() {
        let mut t = task(5, "todo");
        t.estimate_hours = Some(2.5);
        t.sprint_id = Some(3);
        t.category = Some("bug".into());
        assert_eq!(task_line(&t), "#5 [todo] task 5 (2.5h est.) · sprint 3 · bug");
    }

    #[test]
    fn done_tasks_sort_last() {
        let text = task_list("Tasks:", &[task(1, "done"), task(2, "todo")]);
        let open = text.find("#2").unwrap();
        let done = text.find("#1").unwrap();
        assert!(open < done);
    }

    #[test]
    fn empty_lists() {
        assert_eq!(task_list("Tasks:", &[]), "Tasks:\nNo tasks.");
        assert_eq!(pending_user_list(&[]), "No pending users.");
        assert_eq!(sprint_list(&[]), "No sprints in this project yet.");
    }

    #[test]
    fn pending_users_show_ids() {
        let user = User::from_new(4, NewUser::pending(9, 1, "Alan", "Turing"));
        assert!(pending_user_list(&[user]).contains("#4 Alan Turing"));
    }
}
