//! Chat logic behind the Telegram bot, independent of the transport.

use std::sync::Arc;

use log::{debug, info};

use crate::error::AppResult;
use crate::models::message::{SENDER_BOT, SENDER_USER};
use crate::models::{
    BotMessage, NewMessage, NewTask, NewUser, Role, TaskFilter, TaskPatch, User, UserPatch,
};
use crate::store::Store;
use super::commands::{
    BotInput, TaskAction, BUTTON_ADD_TASK, BUTTON_HIDE, BUTTON_MY_TASKS, BUTTON_PENDING_USERS,
    BUTTON_PROJECT_TASKS, BUTTON_SPRINTS,
};
use super::format;
use super::onboarding::{infer_step, pending_prompt, OnboardingStep, Prompt};

const MANAGERS_ONLY: &str = "Only managers can do that.";

#[derive(Debug, Clone)]
pub struct Incoming {
    pub telegram_id: i64,
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    Unchanged,
    Menu(Vec<Vec<String>>),
    Remove,
}

/// A message for some other chat, e.g. telling a user they were approved.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
    pub prompt: Option<Prompt>,
    pub notifications: Vec<Notification>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: Keyboard::Unchanged,
            prompt: None,
            notifications: Vec::new(),
        }
    }

    fn asking(mut self, prompt: Prompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    fn keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    fn notify(mut self, chat_id: Option<i64>, text: impl Into<String>) -> Self {
        if let Some(chat_id) = chat_id {
            self.notifications.push(Notification { chat_id, text: text.into() });
        }
        self
    }
}

pub fn menu_for(role: Role) -> Keyboard {
    let rows: Vec<Vec<&str>> = match role {
        Role::Manager => vec![
            vec![BUTTON_MY_TASKS, BUTTON_PROJECT_TASKS],
            vec![BUTTON_ADD_TASK, BUTTON_SPRINTS],
            vec![BUTTON_PENDING_USERS, BUTTON_HIDE],
        ],
        Role::Developer => vec![
            vec![BUTTON_MY_TASKS, BUTTON_ADD_TASK],
            vec![BUTTON_SPRINTS, BUTTON_HIDE],
        ],
        Role::Pending => return Keyboard::Remove,
    };
    Keyboard::Menu(
        rows.into_iter()
            .map(|row| row.into_iter().map(String::from).collect())
            .collect(),
    )
}

pub struct Conversation {
    store: Arc<dyn Store>,
    history_limit: i64,
}

impl Conversation {
    pub fn new(store: Arc<dyn Store>, history_limit: i64) -> Self {
        Conversation { store, history_limit }
    }

    /// Handles one chat message and stores both it and the reply.
    pub async fn handle(&self, incoming: Incoming) -> AppResult<Reply> {
        let history = self
            .store
            .recent_messages(incoming.telegram_id, self.history_limit)
            .await?;
        self.store
            .record_message(NewMessage {
                telegram_id: incoming.telegram_id,
                chat_id: incoming.chat_id,
                sender: SENDER_USER,
                text: incoming.text.clone(),
                prompt: None,
            })
            .await?;

        let input = BotInput::parse(&incoming.text);
        debug!("Telegram user {} sent {:?}", incoming.telegram_id, input);

        let reply = match self.store.find_user_by_telegram_id(incoming.telegram_id).await? {
            None => self.onboard(&incoming, input, &history).await?,
            Some(user) if user.role() == Role::Pending => Reply::text(format!(
                "Hi {}, your registration is waiting for a manager's approval.",
                user.first_name
            ))
            .keyboard(Keyboard::Remove),
            Some(user) => self.dispatch(&user, input, &history).await?,
        };

        self.store
            .record_message(NewMessage {
                telegram_id: incoming.telegram_id,
                chat_id: incoming.chat_id,
                sender: SENDER_BOT,
                text: reply.text.clone(),
                prompt: reply.prompt.map(|p| p.as_str().to_string()),
            })
            .await?;
        Ok(reply)
    }

    async fn onboard(
        &self,
        incoming: &Incoming,
        input: BotInput,
        history: &[BotMessage],
    ) -> AppResult<Reply> {
        let step = match input {
            BotInput::Start => OnboardingStep::Start,
            _ => infer_step(history),
        };
        let answer = incoming.text.trim();
        let usable = !answer.is_empty() && !answer.starts_with('/');

        let reply = match step {
            OnboardingStep::Start => Reply::text(
                "Welcome to the to-do bot! You are not registered yet.\nWhat is your first name?",
            )
            .asking(Prompt::FirstName)
            .keyboard(Keyboard::Remove),
            OnboardingStep::AwaitingFirstName if !usable => {
                Reply::text("Please type your first name.").asking(Prompt::FirstName)
            }
            OnboardingStep::AwaitingFirstName => {
                Reply::text(format!("Thanks, {}. What is your last name?", answer))
                    .asking(Prompt::LastName)
            }
            OnboardingStep::AwaitingLastName { .. } if !usable => {
                Reply::text("Please type your last name.").asking(Prompt::LastName)
            }
            OnboardingStep::AwaitingLastName { .. } => {
                let projects = self.store.list_projects().await?;
                let mut text = String::from("Which project do you want to join? Send its id.");
                for project in &projects {
                    text.push_str(&format!("\n#{} {}", project.id, project.name));
                }
                Reply::text(text).asking(Prompt::ProjectId)
            }
            OnboardingStep::AwaitingProjectId { first_name, last_name } => {
                let project = match answer.trim_start_matches('#').parse::<i64>() {
                    Ok(id) => self.store.get_project(id).await?,
                    Err(_) => None,
                };
                match project {
                    None => Reply::text(format!(
                        "Project {} does not exist. Which project do you want to join? Send its id.",
                        answer
                    ))
                    .asking(Prompt::ProjectId),
                    Some(project) => {
                        let user = self
                            .store
                            .create_user(NewUser::pending(
                                incoming.telegram_id,
                                project.id,
                                &first_name,
                                &last_name,
                            ))
                            .await?;
                        info!(
                            "Telegram user {} registered as pending user {} in project {}",
                            incoming.telegram_id, user.id, project.id
                        );
                        Reply::text(format!(
                            "Thanks {}! Your request to join {} is waiting for a manager's approval.",
                            user.first_name, project.name
                        ))
                        .keyboard(Keyboard::Remove)
                    }
                }
            }
        };
        Ok(reply)
    }

    async fn dispatch(&self, user: &User, input: BotInput, history: &[BotMessage]) -> AppResult<Reply> {
        let role = user.role();
        let reply = match input {
            BotInput::Start | BotInput::Menu => {
                Reply::text(format!("Hi {}! What would you like to do?", user.first_name))
                    .keyboard(menu_for(role))
            }
            BotInput::Help => Reply::text(help_text(role)),
            BotInput::HideKeyboard => Reply::text("Keyboard hidden. Send /menu to bring it back.")
                .keyboard(Keyboard::Remove),
            BotInput::MyTasks => {
                let tasks = self
                    .store
                    .list_tasks(TaskFilter {
                        project_id: Some(user.project_id),
                        assigned_to: Some(user.id),
                        ..Default::default()
                    })
                    .await?;
                Reply::text(format::task_list("Your tasks:", &tasks))
            }
            BotInput::ProjectTasks if role != Role::Manager => Reply::text(MANAGERS_ONLY),
            BotInput::ProjectTasks => {
                let tasks = self
                    .store
                    .list_tasks(TaskFilter {
                        project_id: Some(user.project_id),
                        ..Default::default()
                    })
                    .await?;
                Reply::text(format::task_list("Project tasks:", &tasks))
            }
            BotInput::AddTask => {
                Reply::text("Type the description of the new task.").asking(Prompt::TaskDescription)
            }
            BotInput::Sprints => {
                let sprints = self.store.list_sprints(Some(user.project_id)).await?;
                Reply::text(format::sprint_list(&sprints))
            }
            BotInput::PendingUsers if role != Role::Manager => Reply::text(MANAGERS_ONLY),
            BotInput::PendingUsers => {
                let users = self
                    .store
                    .list_users(user.project_id, Some(Role::Pending.as_str()))
                    .await?;
                Reply::text(format::pending_user_list(&users))
            }
            BotInput::Approve { .. } | BotInput::Reject { .. } | BotInput::Assign { .. }
                if role != Role::Manager =>
            {
                Reply::text(MANAGERS_ONLY)
            }
            BotInput::Approve { user_id, role } => self.approve(user, user_id, role).await?,
            BotInput::Reject { user_id } => self.reject(user, user_id).await?,
            BotInput::Assign { task_id, user_id } => self.assign(user, task_id, user_id).await?,
            BotInput::Task { task_id, action } => self.task_action(user, task_id, action).await?,
            BotInput::Unknown(command) => Reply::text(format!(
                "Unknown command: {}\n\nUse /help to see available commands.",
                command
            )),
            BotInput::Text(text) => {
                if pending_prompt(history) == Some(Prompt::TaskDescription) && !text.is_empty() {
                    let task = self
                        .store
                        .create_task(NewTask::from_chat(user.project_id, user.id, &text))
                        .await?;
                    info!("User {} created task {} from chat", user.id, task.id);
                    Reply::text(format!("Created task:\n{}", format::task_line(&task)))
                        .keyboard(menu_for(role))
                } else {
                    Reply::text("I didn't understand that. Use the menu or /help.")
                        .keyboard(menu_for(role))
                }
            }
        };
        Ok(reply)
    }

    /// A user in the manager's own project, or `None`.
    async fn project_member(&self, manager: &User, user_id: i64) -> AppResult<Option<User>> {
        Ok(self
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.project_id == manager.project_id))
    }

    async fn approve(&self, manager: &User, user_id: i64, role: Option<String>) -> AppResult<Reply> {
        let role = match role.as_deref().map(str::parse::<Role>) {
            None => Role::Developer,
            Some(Ok(role)) if role != Role::Pending => role,
            Some(_) => return Ok(Reply::text("Role must be developer or manager.")),
        };
        let target = self
            .project_member(manager, user_id)
            .await?
            .filter(|u| u.role() == Role::Pending);
        let Some(target) = target else {
            return Ok(Reply::text(format!("Pending user #{} not found.", user_id)));
        };
        let Some(updated) = self.store.update_user(target.id, UserPatch::role(role)).await? else {
            return Ok(Reply::text(format!("User #{} not found.", user_id)));
        };
        info!("Manager {} approved user {} as {}", manager.id, updated.id, role);
        Ok(Reply::text(format!("{} is now a {}.", updated.full_name(), role)).notify(
            updated.telegram_id,
            format!("You have been approved as a {}. Send /start to begin.", role),
        ))
    }

    async fn reject(&self, manager: &User, user_id: i64) -> AppResult<Reply> {
        let target = self
            .project_member(manager, user_id)
            .await?
            .filter(|u| u.role() == Role::Pending);
        let Some(target) = target else {
            return Ok(Reply::text(format!("No pending user #{}.", user_id)));
        };
        self.store.delete_user(target.id).await?;
        info!("Manager {} rejected user {}", manager.id, target.id);
        Ok(Reply::text(format!("Rejected {}.", target.full_name())).notify(
            target.telegram_id,
            "Your registration was declined. Send /start to try again.",
        ))
    }

    async fn assign(&self, manager: &User, task_id: i64, user_id: i64) -> AppResult<Reply> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .filter(|t| t.project_id == manager.project_id);
        if task.is_none() {
            return Ok(Reply::text(format!("Task #{} not found.", task_id)));
        }
        let assignee = self
            .project_member(manager, user_id)
            .await?
            .filter(|u| u.role() != Role::Pending);
        let Some(assignee) = assignee else {
            return Ok(Reply::text(format!("User #{} is not an active member of this project.", user_id)));
        };
        let Some(task) = self.store.update_task(task_id, TaskPatch::assign(assignee.id)).await? else {
            return Ok(Reply::text(format!("Task #{} not found.", task_id)));
        };
        Ok(Reply::text(format!("Assigned to {}:\n{}", assignee.full_name(), format::task_line(&task)))
            .notify(
                assignee.telegram_id,
                format!("You have a new task:\n{}", format::task_line(&task)),
            ))
    }

    async fn task_action(&self, user: &User, task_id: i64, action: TaskAction) -> AppResult<Reply> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .filter(|t| t.project_id == user.project_id);
        let Some(task) = task else {
            return Ok(Reply::text(format!("Task #{} not found.", task_id)));
        };

        let is_manager = user.is_manager();
        let reply = match action {
            TaskAction::Status(status) => {
                if !is_manager && task.assigned_to != Some(user.id) {
                    return Ok(Reply::text("You can only update tasks assigned to you."));
                }
                match self.store.update_task(task.id, TaskPatch::status(status)).await? {
                    Some(updated) => Reply::text(format!("Updated:\n{}", format::task_line(&updated))),
                    None => Reply::text(format!("Task #{} not found.", task_id)),
                }
            }
            TaskAction::Delete => {
                if !is_manager && task.created_by != Some(user.id) {
                    return Ok(Reply::text("You can only delete tasks you created."));
                }
                self.store.delete_task(task.id).await?;
                Reply::text(format!("Task #{} deleted.", task.id))
            }
        };
        Ok(reply)
    }
}

fn help_text(role: Role) -> String {
    let mut text = String::from(
        "/mytasks - tasks assigned to you\n\
         /add - create a task\n\
         /sprints - sprints of your project\n\
         <id>-START, <id>-DONE, <id>-UNDO - change a task's status\n\
         <id>-DELETE - delete a task you created\n\
         /menu - show the keyboard",
    );
    if role == Role::Manager {
        text.push_str(
            "\n/tasks - every task in the project\n\
             /pending - users waiting for approval\n\
             /approve <user> [developer|manager]\n\
             /reject <user>\n\
             /assign <task> <user>",
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_users_get_no_menu() {
        assert_eq!(menu_for(Role::Pending), Keyboard::Remove);
    }

    #[test]
    fn managers_see_manager_buttons() {
        let Keyboard::Menu(rows) = menu_for(Role::Manager) else {
            panic!("manager menu expected");
        };
        assert!(rows.iter().flatten().any(|b| b == BUTTON_PENDING_USERS));

        let Keyboard::Menu(rows) = menu_for(Role::Developer) else {
            panic!("developer menu expected");
        };
        assert!(!rows.iter().flatten().any(|b| b == BUTTON_PROJECT_TASKS));
    }

    #[test]
    fn help_lists_manager_commands_for_managers_only() {
        assert!(help_text(Role::Manager).contains("/approve"));
        assert!(!help_text(Role::Developer).contains("/approve"));
    }
}
