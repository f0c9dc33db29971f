/// Database models for TaskNest
///
/// # Models
///
/// - `user`: accounts with local and/or federated credentials
/// - `task`: owner-scoped work items with status, priority, and deadline

pub mod task;
pub mod user;
