//! HTTP handlers for the chorepool API.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use super::error::{AppError, JsonBody};
use super::middleware::CurrentUser;
use super::routes::AppState;
use crate::actions::{
    CreateGroupAction, CreateTaskAction, DeleteTaskAction, GrantPointsAction, JoinGroupAction,
    LeaveGroupAction, ListTasksAction, LoginAction, LogoutAction, RegisterAction,
    ResolveMemberAction, StepTaskAction, ToggleCompletionAction, UpdateTaskAction,
};
use crate::api::{
    CompletionRequest, CompletionResponse, CreateGroupRequest, CreateTaskRequest,
    CredentialsRequest, DeletedResponse, GrantPointsRequest, GroupCreatedResponse, GroupResponse,
    JoinGroupRequest, MessageResponse, PoolResponse, RegisteredResponse, StepResponse,
    StepTaskRequest, TaskCreatedResponse, TaskIdRequest, TokenResponse, UpdateTaskRequest,
    ValidateResponse,
};
use crate::ledger::{GroupRepository, LedgerRepository, Member, NewTask, StepAction, TaskEdit};
use crate::session::{build_session_cookie, clear_session_cookie};
use crate::{ChoreError, User, UserRepository};

async fn member_of<U>(users: &U, current: &CurrentUser) -> Result<Member, AppError>
where
    U: UserRepository + Clone,
{
    Ok(ResolveMemberAction::new(users.clone())
        .execute(&current.username)
        .await?)
}

async fn user_of<U>(users: &U, current: &CurrentUser) -> Result<User, AppError>
where
    U: UserRepository + Clone,
{
    Ok(ResolveMemberAction::new(users.clone())
        .user(&current.username)
        .await?)
}

/// Register a new user.
///
/// POST /register
pub async fn register<U, L>(
    State(state): State<AppState<U, L>>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    let user = RegisterAction::with_hasher(state.user_repo, state.hasher)
        .execute(&body.username, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "User registered successfully".to_owned(),
            user_id: user.id,
        }),
    ))
}

/// Verify credentials, set the session cookie and return the token.
///
/// POST /login
pub async fn login<U, L>(
    State(state): State<AppState<U, L>>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    let (_, token) = LoginAction::with_hasher(state.user_repo, state.sessions, state.hasher)
        .execute(&body.username, &body.password)
        .await?;

    let cookie = build_session_cookie(&state.session_config, token.expose_secret());
    Ok(([(header::SET_COOKIE, cookie)], Json(TokenResponse { token })))
}

/// POST /logout
pub async fn logout<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError>
where
    U: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    LogoutAction::new(state.sessions)
        .execute(&current.token)
        .await?;

    let cookie = clear_session_cookie(&state.session_config);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// GET /validate
pub async fn validate<U, L>(current: CurrentUser) -> Json<ValidateResponse>
where
    U: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    Json(ValidateResponse {
        message: "Session is valid".to_owned(),
        user: current.username,
    })
}

/// Tasks of the caller's group.
///
/// GET /task
pub async fn list_tasks<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;
    let tasks = ListTasksAction::new(state.ledger).execute(&member).await?;
    Ok(Json(tasks))
}

/// Create a task, debiting the group's pool.
///
/// POST /task
pub async fn create_task<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;
    let task = NewTask {
        name: body.name,
        description: body.description,
        due_date: body.due_date,
        points_value: body.points_value,
        step: body.step,
    };

    let task = CreateTaskAction::new(state.ledger)
        .execute(&member, task)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskCreatedResponse {
            id: task.id,
            creator_username: task.creator_username,
        }),
    ))
}

/// Creator-only edit.
///
/// PUT /task
pub async fn update_task<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;
    let edit = TaskEdit {
        task_id: body.task_id,
        name: body.name,
        description: body.description,
        due_date: body.due_date,
        points_value: body.points_value,
    };

    UpdateTaskAction::new(state.ledger)
        .execute(&member, edit)
        .await?;

    Ok(Json(MessageResponse::new("Task updated successfully")))
}

/// PATCH /task/step
pub async fn step_task<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<StepTaskRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let action: StepAction = body.action.parse()?;
    let member = member_of(&state.user_repo, &current).await?;

    let change = StepTaskAction::new(state.ledger)
        .execute(&member, body.task_id, action)
        .await?;

    Ok(Json(StepResponse {
        task_id: change.task_id,
        step: change.step,
        message: "Task step updated successfully".to_owned(),
    }))
}

/// Complete or reopen a task.
///
/// PATCH /task/completion
pub async fn toggle_completion<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<CompletionRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;

    let change = ToggleCompletionAction::new(state.ledger)
        .execute(&member, body.task_id, body.completed)
        .await?;

    Ok(Json(CompletionResponse {
        task_id: change.task_id,
        completed: change.completed,
        message: "Task completion status updated successfully".to_owned(),
    }))
}

/// Creator-only delete, refunding an unfinished task.
///
/// DELETE /task
pub async fn delete_task<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<TaskIdRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;

    let deletion = DeleteTaskAction::new(state.ledger)
        .execute(&member, body.task_id)
        .await?;

    Ok(Json(DeletedResponse::from(deletion)))
}

/// GET /group
pub async fn get_group<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: GroupRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;
    let group = state
        .ledger
        .find_group(member.group_id)
        .await?
        .ok_or(ChoreError::GroupNotFound)?;

    Ok(Json(GroupResponse::from(group)))
}

/// Create a group and join it.
///
/// POST /group
pub async fn create_group<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: GroupRepository + Clone + Send + Sync + 'static,
{
    let user = user_of(&state.user_repo, &current).await?;

    let group = CreateGroupAction::new(state.user_repo, state.ledger)
        .execute(&user, &body.name, body.initial_points)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupCreatedResponse {
            id: group.id,
            code: group.code,
        }),
    ))
}

/// POST /group/join
pub async fn join_group<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<JoinGroupRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: GroupRepository + Clone + Send + Sync + 'static,
{
    let user = user_of(&state.user_repo, &current).await?;

    JoinGroupAction::new(state.user_repo, state.ledger)
        .execute(&user, &body.code)
        .await?;

    Ok(Json(MessageResponse::new("Joined group successfully")))
}

/// POST /group/leave
pub async fn leave_group<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    let user = user_of(&state.user_repo, &current).await?;
    LeaveGroupAction::new(state.user_repo).execute(&user).await?;

    Ok(Json(MessageResponse::new("Left group successfully")))
}

/// Top up the pool. Only the group's creator may do this.
///
/// POST /group/points
pub async fn grant_points<U, L>(
    State(state): State<AppState<U, L>>,
    current: CurrentUser,
    JsonBody(body): JsonBody<GrantPointsRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: GroupRepository + Clone + Send + Sync + 'static,
{
    let member = member_of(&state.user_repo, &current).await?;

    let pool = GrantPointsAction::new(state.ledger)
        .execute(&member, body.amount)
        .await?;

    Ok(Json(PoolResponse::from(pool)))
}
