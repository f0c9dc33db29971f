/// Service layer: orchestration with typed outcomes
///
/// Services own the business flow between the HTTP handlers and the shared
/// primitives (models, password hashing, tokens, federated verification).
/// Each holds its injected store handle; there are no ambient globals.
///
/// - `auth`: registration, local login, federated login
/// - `tasks`: owner-scoped task create/list/patch/delete

pub mod auth;
pub mod tasks;
