pub mod auth;
pub mod obra;
pub mod rbac;
