//! Authentication Module
//! Mission: JWT issuance/verification, cache-aside identity resolution, RBAC gates

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod resolver;
pub mod store;

pub use jwt::TokenService;
pub use middleware::{auth_gate, roles_gate, RoleGate, RouteMeta};
pub use models::{Claims, Profile, Role, RoleName};
pub use resolver::Resolver;
pub use store::AuthStore;
