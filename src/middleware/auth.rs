use crate::core::{AgentRole, AppError, CallerContext};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Identity-header verification middleware.
///
/// Authentication happens upstream: the identity gateway validates the
/// agent's session and forwards `X-Agent-Id` and `X-Agent-Role`, signed with
/// a shared secret in `X-Identity-Signature` (hex HMAC-SHA256 over
/// `"<agent_id>:<role>"`). This middleware verifies the signature, resolves
/// the role, and injects a [`CallerContext`] for handlers to extract.
pub struct AgentIdentity {
    secret: Arc<Vec<u8>>,
}

impl AgentIdentity {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Arc::new(secret.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AgentIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AgentIdentityMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AgentIdentityMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct AgentIdentityMiddleware<S> {
    service: Rc<S>,
    secret: Arc<Vec<u8>>,
}

impl<S, B> Service<ServiceRequest> for AgentIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            // Liveness and root endpoints carry no identity
            let path = req.path();
            if path == "/health" || path == "/" {
                return svc.call(req).await;
            }

            let agent_id = header_value(&req, "X-Agent-Id")?;
            let role_raw = header_value(&req, "X-Agent-Role")?;
            let signature = header_value(&req, "X-Identity-Signature")?;

            if !verify_identity_signature(&secret, &agent_id, &role_raw, &signature) {
                tracing::warn!(agent_id = %agent_id, "Rejected request with bad identity signature");
                return Err(Error::from(AppError::forbidden(
                    "Identity signature verification failed",
                )));
            }

            let role = AgentRole::from_str(&role_raw)
                .map_err(|e| Error::from(AppError::forbidden(e)))?;

            req.extensions_mut()
                .insert(CallerContext::new(agent_id, role));

            svc.call(req).await
        })
    }
}

fn header_value(req: &ServiceRequest, name: &str) -> std::result::Result<String, Error> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::from(AppError::forbidden(format!("Missing {} header", name))))
}

/// Sign an `agent_id:role` pair the way the identity gateway does.
///
/// Shared with tests; the production signer lives in the gateway.
pub fn sign_identity(secret: &[u8], agent_id: &str, role: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(format!("{}:{}", agent_id, role).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a forwarded identity signature.
pub fn verify_identity_signature(
    secret: &[u8],
    agent_id: &str,
    role: &str,
    signature_hex: &str,
) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(format!("{}:{}", agent_id, role).as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Extract the resolved caller from request extensions.
///
/// Handlers take `caller: CallerContext` as an argument; a missing context
/// means the route was registered outside the identity middleware, which is
/// a wiring bug surfaced as a forbidden response rather than a panic.
impl FromRequest for CallerContext {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = req.extensions().get::<CallerContext>().cloned();
        ready(caller.ok_or_else(|| {
            Error::from(AppError::forbidden("No caller identity on this request"))
        }))
    }
}
