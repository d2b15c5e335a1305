pub mod auth;
pub mod request_id;

pub use auth::{sign_identity, verify_identity_signature, AgentIdentity};
pub use request_id::{RequestId, RequestIdMiddleware};
