//! Use cases, one struct per operation.
//!
//! Every action is built from the repositories it needs and consumed with
//! `execute`. Actions validate input, call the storage layer, then fire a
//! [`LedgerEvent`](crate::events::LedgerEvent) once the change has committed.
//!
//! | Action | Operation |
//! |--------|-----------|
//! | [`RegisterAction`] | create an account |
//! | [`LoginAction`] | verify credentials and issue a session |
//! | [`LogoutAction`] | revoke a session |
//! | [`ValidateSessionAction`] | resolve a token to a username |
//! | [`ResolveMemberAction`] | username to user and group membership |
//! | [`CreateTaskAction`] .. [`DeleteTaskAction`] | ledger transitions |
//! | [`CreateGroupAction`], [`JoinGroupAction`], [`LeaveGroupAction`], [`GrantPointsAction`] | group membership and pool top-ups |
//! | [`SweepExpiredAction`] | periodic cleanup of sessions and idle rate buckets |

mod create_group;
mod create_task;
mod delete_task;
mod grant_points;
mod join_group;
mod leave_group;
mod list_tasks;
mod login;
mod logout;
mod register;
mod resolve_member;
mod step_task;
mod sweep_expired;
mod toggle_completion;
mod update_task;
mod validate_session;

pub use create_group::CreateGroupAction;
pub use create_task::CreateTaskAction;
pub use delete_task::DeleteTaskAction;
pub use grant_points::GrantPointsAction;
pub use join_group::JoinGroupAction;
pub use leave_group::LeaveGroupAction;
pub use list_tasks::ListTasksAction;
pub use login::LoginAction;
pub use logout::LogoutAction;
pub use register::RegisterAction;
pub use resolve_member::ResolveMemberAction;
pub use step_task::StepTaskAction;
pub use sweep_expired::{SweepExpiredAction, SweepResult};
pub use toggle_completion::ToggleCompletionAction;
pub use update_task::UpdateTaskAction;
pub use validate_session::ValidateSessionAction;
