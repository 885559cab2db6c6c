use chrono::{DateTime, Utc};

/// Events emitted by chorepool actions.
///
/// Pool and score values are the group's balance right after the
/// transition committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    // accounts and sessions
    UserRegistered {
        user_id: i64,
        username: String,
        at: DateTime<Utc>,
    },
    LoginSucceeded {
        username: String,
        at: DateTime<Utc>,
    },
    LoginFailed {
        username: String,
        reason: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        username: String,
        at: DateTime<Utc>,
    },

    // groups
    GroupCreated {
        group_id: i64,
        creator_user_id: i64,
        pool: i64,
        at: DateTime<Utc>,
    },
    GroupJoined {
        group_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    GroupLeft {
        group_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    PointsGranted {
        group_id: i64,
        amount: i64,
        pool: i64,
        at: DateTime<Utc>,
    },

    // tasks
    TaskCreated {
        task_id: i64,
        group_id: i64,
        points_value: i64,
        at: DateTime<Utc>,
    },
    TaskUpdated {
        task_id: i64,
        group_id: i64,
        points_delta: i64,
        pool: i64,
        at: DateTime<Utc>,
    },
    TaskStepChanged {
        task_id: i64,
        group_id: i64,
        step: i32,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: i64,
        group_id: i64,
        points_value: i64,
        score: i64,
        at: DateTime<Utc>,
    },
    TaskReopened {
        task_id: i64,
        group_id: i64,
        points_value: i64,
        score: i64,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: i64,
        group_id: i64,
        returned_points: i64,
        pool: i64,
        at: DateTime<Utc>,
    },

    // housekeeping
    ExpiredStateSwept {
        sessions: u64,
        buckets: u64,
        at: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user.registered",
            Self::LoginSucceeded { .. } => "session.login.success",
            Self::LoginFailed { .. } => "session.login.failed",
            Self::LoggedOut { .. } => "session.logout",
            Self::GroupCreated { .. } => "group.created",
            Self::GroupJoined { .. } => "group.joined",
            Self::GroupLeft { .. } => "group.left",
            Self::PointsGranted { .. } => "group.points_granted",
            Self::TaskCreated { .. } => "task.created",
            Self::TaskUpdated { .. } => "task.updated",
            Self::TaskStepChanged { .. } => "task.step_changed",
            Self::TaskCompleted { .. } => "task.completed",
            Self::TaskReopened { .. } => "task.reopened",
            Self::TaskDeleted { .. } => "task.deleted",
            Self::ExpiredStateSwept { .. } => "housekeeping.swept",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::UserRegistered { at, .. }
            | Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LoggedOut { at, .. }
            | Self::GroupCreated { at, .. }
            | Self::GroupJoined { at, .. }
            | Self::GroupLeft { at, .. }
            | Self::PointsGranted { at, .. }
            | Self::TaskCreated { at, .. }
            | Self::TaskUpdated { at, .. }
            | Self::TaskStepChanged { at, .. }
            | Self::TaskCompleted { at, .. }
            | Self::TaskReopened { at, .. }
            | Self::TaskDeleted { at, .. }
            | Self::ExpiredStateSwept { at, .. } => *at,
        }
    }

    /// The group this event belongs to, if any.
    pub fn group_id(&self) -> Option<i64> {
        match self {
            Self::GroupCreated { group_id, .. }
            | Self::GroupJoined { group_id, .. }
            | Self::GroupLeft { group_id, .. }
            | Self::PointsGranted { group_id, .. }
            | Self::TaskCreated { group_id, .. }
            | Self::TaskUpdated { group_id, .. }
            | Self::TaskStepChanged { group_id, .. }
            | Self::TaskCompleted { group_id, .. }
            | Self::TaskReopened { group_id, .. }
            | Self::TaskDeleted { group_id, .. } => Some(*group_id),
            Self::UserRegistered { .. }
            | Self::LoginSucceeded { .. }
            | Self::LoginFailed { .. }
            | Self::LoggedOut { .. }
            | Self::ExpiredStateSwept { .. } => None,
        }
    }
}
