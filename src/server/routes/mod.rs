//! One module per API area. Each exposes `router()` with its `/api/*` routes;
//! the auth guard is layered on by `workbench_router`.

pub mod chats;
pub mod datasets;
pub mod dev;
pub mod feedback;
pub mod health;
pub mod invoke;
pub mod messages;
pub mod providers;
pub mod registry;
pub mod settings;
