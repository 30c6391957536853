//! Turns chat text into something the conversation can act on.

use crate::models::TaskStatus;

pub const BUTTON_MY_TASKS: &str = "My Tasks";
pub const BUTTON_PROJECT_TASKS: &str = "Project Tasks";
pub const BUTTON_ADD_TASK: &str = "Add Task";
pub const BUTTON_SPRINTS: &str = "Sprints";
pub const BUTTON_PENDING_USERS: &str = "Pending Users";
pub const BUTTON_HIDE: &str = "Hide Keyboard";

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Status(TaskStatus),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BotInput {
    Start,
    Help,
    Menu,
    MyTasks,
    ProjectTasks,
    AddTask,
    Sprints,
    PendingUsers,
    HideKeyboard,
    Approve { user_id: i64, role: Option<String> },
    Reject { user_id: i64 },
    Assign { task_id: i64, user_id: i64 },
    Task { task_id: i64, action: TaskAction },
    /// A slash command that did not parse; carries the command word.
    Unknown(String),
    Text(String),
}

impl BotInput {
    pub fn parse(text: &str) -> BotInput {
        let text = text.trim();

        match text {
            BUTTON_MY_TASKS => return BotInput::MyTasks,
            BUTTON_PROJECT_TASKS => return BotInput::ProjectTasks,
            BUTTON_ADD_TASK => return BotInput::AddTask,
            BUTTON_SPRINTS => return BotInput::Sprints,
            BUTTON_PENDING_USERS => return BotInput::PendingUsers,
            BUTTON_HIDE => return BotInput::HideKeyboard,
            _ => {}
        }

        if let Some(input) = parse_task_action(text) {
            return input;
        }

        if !text.starts_with('/') {
            return BotInput::Text(text.to_string());
        }

        let mut words = text.split_whitespace();
        let command = words.next().unwrap_or_default();
        // "/start@my_bot" in group chats
        let name = command
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let parsed = match (name.as_str(), args.as_slice()) {
            ("start", _) => Some(BotInput::Start),
            ("help", _) => Some(BotInput::Help),
            ("menu", _) => Some(BotInput::Menu),
            ("mytasks", _) => Some(BotInput::MyTasks),
            ("tasks", _) => Some(BotInput::ProjectTasks),
            ("add", _) => Some(BotInput::AddTask),
            ("sprints", _) => Some(BotInput::Sprints),
            ("pending", _) => Some(BotInput::PendingUsers),
            ("hide", _) => Some(BotInput::HideKeyboard),
            ("approve", [user]) => parse_id(user).map(|user_id| BotInput::Approve { user_id, role: None }),
            ("approve", [user, role]) => parse_id(user).map(|user_id| BotInput::Approve {
                user_id,
                role: Some(role.to_string()),
            }),
            ("reject", [user]) => parse_id(user).map(|user_id| BotInput::Reject { user_id }),
            ("assign", [task, user]) => match (parse_id(task), parse_id(user)) {
                (Some(task_id), Some(user_id)) => Some(BotInput::Assign { task_id, user_id }),
                _ => None,
            },
            _ => None,
        };

        parsed.unwrap_or_else(|| BotInput::Unknown(command.to_string()))
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim_start_matches('#').parse().ok()
}

/// `12-DONE`, `12-START`, `12-UNDO`, `12-DELETE`.
fn parse_task_action(text: &str) -> Option<BotInput> {
    let (id, verb) = text.split_once('-')?;
    let task_id = parse_id(id.trim())?;
    let action = match verb.trim().to_ascii_uppercase().as_str() {
        "DONE" => TaskAction::Status(TaskStatus::Done),
        "START" => TaskAction::Status(TaskStatus::InProgress),
        "UNDO" => TaskAction::Status(TaskStatus::Todo),
        "DELETE" => TaskAction::Delete,
        _ => return None,
    };
    Some(BotInput::Task { task_id, action })
}
