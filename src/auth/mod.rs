//! Authentication delegation - token validation against the auth service

pub mod validator;

pub use validator::{AuthContext, AuthValidator, HttpAuthValidator};
