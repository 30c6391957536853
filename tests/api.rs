use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use todo_backend::routes::routes::configure;
use todo_backend::store::{MemoryStore, Store};

const AUTH: (&str, &str) = ("Authorization", "Bearer test-token");

macro_rules! app {
    () => {{
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        test::init_service(
            App::new()
                .app_data(web::Data::from(store))
                .configure(configure),
        )
        .await
    }};
}

macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

macro_rules! call_status {
    ($app:expr, $req:expr) => {{
        test::call_service(&$app, $req.to_request()).await.status()
    }};
}

#[actix_web::test]
async fn api_requires_a_bearer_token() {
    let app = app!();

    let status = call_status!(app, test::TestRequest::get().uri("/api/projects"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = call_status!(
        app,
        test::TestRequest::get()
            .uri("/api/projects")
            .insert_header(("Authorization", "Bearer "))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = call_status!(app, test::TestRequest::get().uri("/api/projects").insert_header(AUTH));
    assert_eq!(status, StatusCode::OK);

    // outside /api nothing is gated
    let status = call_status!(app, test::TestRequest::get().uri("/todolist"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn project_create_then_fetch() {
    let app = app!();

    let (status, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({
                "name": "Mobile app",
                "start_time": "2024-01-08T09:00:00Z",
                "end_time": "2024-03-29T18:00:00Z"
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/api/projects/{}", id)).insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["name"], "Mobile app");
}

#[actix_web::test]
async fn project_validation_errors_are_400() {
    let app = app!();

    let status = call_status!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({
                "name": "Backwards",
                "start_time": "2024-03-01T00:00:00Z",
                "end_time": "2024-01-01T00:00:00Z"
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn task_update_changes_only_given_fields() {
    let app = app!();

    let (_, project) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "Backend" }))
    );
    let project_id = project["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/todolist")
            .set_json(json!({
                "project_id": project_id,
                "description": "Write API docs",
                "estimate_hours": 3.0,
                "category": "docs"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let task: Value = test::read_body_json(resp).await;
    assert_eq!(location, task["id"].as_i64().unwrap().to_string());
    assert_eq!(task["status"], "todo");

    let (status, updated) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/todolist/{}", location))
            .set_json(json!({ "status": "in_progress", "real_hours": 1.5 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["real_hours"], 1.5);
    assert_eq!(updated["description"], "Write API docs");
    assert_eq!(updated["estimate_hours"], 3.0);
    assert_eq!(updated["category"], "docs");
    assert_eq!(updated["created_at"], task["created_at"]);

    let status = call_status!(
        app,
        test::TestRequest::put()
            .uri(&format!("/todolist/{}", location))
            .set_json(json!({ "status": "blocked" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delete_then_fetch_is_404() {
    let app = app!();

    let (_, project) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "Throwaway" }))
    );
    let project_id = project["id"].as_i64().unwrap();

    let (_, sprint) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/sprints")
            .set_json(json!({ "project_id": project_id, "name": "Sprint 1" }))
    );
    let sprint_id = sprint["id"].as_i64().unwrap();

    let (_, task) = call_json!(
        app,
        test::TestRequest::post().uri("/todolist").set_json(json!({
            "project_id": project_id,
            "description": "Short-lived",
            "sprint_id": sprint_id
        }))
    );
    let task_id = task["id"].as_i64().unwrap();

    let (status, tasks) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/sprints/{}/tasks", sprint_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let status = call_status!(app, test::TestRequest::delete().uri(&format!("/todolist/{}", task_id)));
    assert_eq!(status, StatusCode::OK);
    let status = call_status!(app, test::TestRequest::get().uri(&format!("/todolist/{}", task_id)));
    assert_eq!(status, StatusCode::NOT_FOUND);
    let status = call_status!(app, test::TestRequest::delete().uri(&format!("/todolist/{}", task_id)));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = call_status!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/projects/{}", project_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    let status = call_status!(app, test::TestRequest::get().uri(&format!("/sprints/{}", sprint_id)));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn task_sprint_must_belong_to_task_project() {
    let app = app!();

    let mut projects = Vec::new();
    for name in ["A", "B"] {
        let (_, project) = call_json!(
            app,
            test::TestRequest::post()
                .uri("/api/projects")
                .insert_header(AUTH)
                .set_json(json!({ "name": name }))
        );
        projects.push(project["id"].as_i64().unwrap());
    }
    let (_, sprint) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/sprints")
            .set_json(json!({ "project_id": projects[1], "name": "B sprint" }))
    );

    let status = call_status!(
        app,
        test::TestRequest::post().uri("/todolist").set_json(json!({
            "project_id": projects[0],
            "description": "Misfiled",
            "sprint_id": sprint["id"]
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn users_are_scoped_to_their_project() {
    let app = app!();

    let mut projects = Vec::new();
    for name in ["Web", "Bot"] {
        let (_, project) = call_json!(
            app,
            test::TestRequest::post()
                .uri("/api/projects")
                .insert_header(AUTH)
                .set_json(json!({ "name": name }))
        );
        projects.push(project["id"].as_i64().unwrap());
    }
    let (web_id, bot_id) = (projects[0], projects[1]);

    let (status, user) = call_json!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/{}/users", web_id))
            .insert_header(AUTH)
            .set_json(json!({
                "telegram_id": 1001,
                "project_id": web_id,
                "first_name": "Linus",
                "last_name": "Torvalds",
                "role": "Developer",
                "title": "Kernel hacker"
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "developer");
    let user_id = user["id"].as_i64().unwrap();

    let (status, fetched) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users/{}", web_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, user);

    // same user through the wrong project
    let status = call_status!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users/{}", bot_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    // body naming another project
    let status = call_status!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/{}/users", bot_id))
            .insert_header(AUTH)
            .set_json(json!({
                "project_id": web_id,
                "first_name": "Ken",
                "last_name": "Thompson",
                "role": "developer"
            }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = call_status!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/{}/users/{}", web_id, user_id))
            .insert_header(AUTH)
            .set_json(json!({ "project_id": bot_id }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/{}/users/{}", web_id, user_id))
            .insert_header(AUTH)
            .set_json(json!({ "role": "manager" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "manager");
    assert_eq!(updated["title"], "Kernel hacker");

    // duplicate telegram account
    let status = call_status!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/{}/users", web_id))
            .insert_header(AUTH)
            .set_json(json!({
                "telegram_id": 1001,
                "project_id": web_id,
                "first_name": "Copy",
                "last_name": "Cat",
                "role": "developer"
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a project with members cannot go away
    let status = call_status!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/projects/{}", web_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = call_status!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/{}/users/{}", web_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    let status = call_status!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users/{}", web_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn user_list_filters_by_role() {
    let app = app!();

    let (_, project) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "Ops" }))
    );
    let project_id = project["id"].as_i64().unwrap();

    for (first, role) in [("Ann", "pending"), ("Bob", "developer"), ("Cy", "pending")] {
        let status = call_status!(
            app,
            test::TestRequest::post()
                .uri(&format!("/api/{}/users", project_id))
                .insert_header(AUTH)
                .set_json(json!({
                    "project_id": project_id,
                    "first_name": first,
                    "last_name": "Doe",
                    "role": role
                }))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, pending) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users?role=pending", project_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = pending
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ann", "Cy"]);

    let status = call_status!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users?role=admin", project_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn sprint_update_and_delete_keep_tasks() {
    let app = app!();

    let (_, project) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "Release" }))
    );
    let project_id = project["id"].as_i64().unwrap();

    let (status, sprint) = call_json!(
        app,
        test::TestRequest::post().uri("/sprints").set_json(json!({
            "project_id": project_id,
            "name": "Sprint 1",
            "description": "Stabilize",
            "start_time": "2024-05-01T00:00:00Z",
            "end_time": "2024-05-14T00:00:00Z"
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let sprint_id = sprint["id"].as_i64().unwrap();

    let (status, updated) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/sprints/{}", sprint_id))
            .set_json(json!({ "end_time": "2024-05-21T00:00:00Z" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Sprint 1");
    assert_eq!(updated["description"], "Stabilize");
    assert_eq!(updated["start_time"], sprint["start_time"]);
    assert_ne!(updated["end_time"], sprint["end_time"]);

    // an end before the start is refused and leaves the sprint alone
    let status = call_status!(
        app,
        test::TestRequest::put()
            .uri(&format!("/sprints/{}", sprint_id))
            .set_json(json!({ "end_time": "2024-04-01T00:00:00Z" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, task) = call_json!(
        app,
        test::TestRequest::post().uri("/todolist").set_json(json!({
            "project_id": project_id,
            "description": "Outlives the sprint",
            "sprint_id": sprint_id
        }))
    );
    let task_id = task["id"].as_i64().unwrap();

    let (status, body) = call_json!(
        app,
        test::TestRequest::delete().uri(&format!("/sprints/{}", sprint_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let status = call_status!(app, test::TestRequest::get().uri(&format!("/sprints/{}", sprint_id)));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, task) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/todolist/{}", task_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(task["sprint_id"].is_null());
    assert_eq!(task["description"], "Outlives the sprint");
}

#[actix_web::test]
async fn todolist_filters_by_status_and_assignee() {
    let app = app!();

    let (_, project) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(AUTH)
            .set_json(json!({ "name": "Filters" }))
    );
    let project_id = project["id"].as_i64().unwrap();

    let (_, user) = call_json!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/{}/users", project_id))
            .insert_header(AUTH)
            .set_json(json!({
                "project_id": project_id,
                "first_name": "Grace",
                "last_name": "Hopper",
                "role": "developer"
            }))
    );
    let user_id = user["id"].as_i64().unwrap();

    let (status, done) = call_json!(
        app,
        test::TestRequest::post().uri("/todolist").set_json(json!({
            "project_id": project_id,
            "description": "Already shipped",
            "status": "DONE",
            "assigned_to": user_id
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(done["status"], "done");

    call_status!(
        app,
        test::TestRequest::post().uri("/todolist").set_json(json!({
            "project_id": project_id,
            "description": "Still open"
        }))
    );

    for query in ["status=done", "status=Done", "status=DONE"] {
        let (status, tasks) = call_json!(
            app,
            test::TestRequest::get().uri(&format!("/todolist?{}", query))
        );
        assert_eq!(status, StatusCode::OK);
        let tasks = tasks.as_array().unwrap();
        assert_eq!(tasks.len(), 1, "{}", query);
        assert_eq!(tasks[0]["id"], done["id"]);
    }

    let (_, tasks) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/todolist?assigned_to={}", user_id))
    );
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let (_, tasks) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/todolist?project_id={}&status=todo", project_id))
    );
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["description"], "Still open");

    let status = call_status!(app, test::TestRequest::get().uri("/todolist?status=blocked"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn nested_task_lists() {
    let app = app!();

    let mut projects = Vec::new();
    for name in ["Core", "Side"] {
        let (_, project) = call_json!(
            app,
            test::TestRequest::post()
                .uri("/api/projects")
                .insert_header(AUTH)
                .set_json(json!({ "name": name }))
        );
        projects.push(project["id"].as_i64().unwrap());
    }
    let (core_id, side_id) = (projects[0], projects[1]);

    let (_, user) = call_json!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/{}/users", core_id))
            .insert_header(AUTH)
            .set_json(json!({
                "project_id": core_id,
                "first_name": "Barbara",
                "last_name": "Liskov",
                "role": "developer"
            }))
    );
    let user_id = user["id"].as_i64().unwrap();

    for (project_id, description, assignee) in [
        (core_id, "Substitution", Some(user_id)),
        (core_id, "Unassigned", None),
        (side_id, "Elsewhere", None),
    ] {
        let status = call_status!(
            app,
            test::TestRequest::post().uri("/todolist").set_json(json!({
                "project_id": project_id,
                "description": description,
                "assigned_to": assignee
            }))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, tasks) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks", core_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    let descriptions: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap())
        .collect();
    assert_eq!(descriptions, vec!["Substitution", "Unassigned"]);

    let (status, tasks) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users/{}/tasks", core_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["description"], "Substitution");

    let status = call_status!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/{}/users/{}/tasks", side_id, user_id))
            .insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = call_status!(
        app,
        test::TestRequest::get().uri("/api/projects/999/tasks").insert_header(AUTH)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_input_gets_a_json_error() {
    let app = app!();

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/todolist")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"description\": ")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call_json!(app, test::TestRequest::get().uri("/todolist?project_id=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
