use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attached to a resolved caller identity.
///
/// Authentication lives with the upstream identity service; this core only
/// ever sees an already-resolved `{agent id, role}` pair and enforces what
/// each role may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Field collector; restricted to customers assigned to them
    FieldAgent,
    /// Branch supervisor; may void entries and edit remarks
    Supervisor,
    /// Back-office admin; same elevation as supervisor
    Admin,
}

impl AgentRole {
    /// Elevated roles bypass the assigned-agent check and may void entries.
    pub fn is_elevated(&self) -> bool {
        matches!(self, AgentRole::Supervisor | AgentRole::Admin)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::FieldAgent => write!(f, "field_agent"),
            AgentRole::Supervisor => write!(f, "supervisor"),
            AgentRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "field_agent" => Ok(AgentRole::FieldAgent),
            "supervisor" => Ok(AgentRole::Supervisor),
            "admin" => Ok(AgentRole::Admin),
            _ => Err(format!("Invalid agent role: {}", s)),
        }
    }
}

/// Resolved identity of the caller for one request.
///
/// Produced by the identity-header middleware and consumed by the collection
/// and report services for role and assignment checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub agent_id: String,
    pub role: AgentRole,
}

impl CallerContext {
    pub fn new(agent_id: impl Into<String>, role: AgentRole) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
        }
    }

    /// Whether this caller may operate on a customer assigned to
    /// `assigned_agent_id`. Field agents are limited to their own book.
    pub fn can_access_customer(&self, assigned_agent_id: &str) -> bool {
        self.role.is_elevated() || self.agent_id == assigned_agent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [AgentRole::FieldAgent, AgentRole::Supervisor, AgentRole::Admin] {
            assert_eq!(AgentRole::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(AgentRole::from_str("manager").is_err());
    }

    #[test]
    fn test_elevation() {
        assert!(!AgentRole::FieldAgent.is_elevated());
        assert!(AgentRole::Supervisor.is_elevated());
        assert!(AgentRole::Admin.is_elevated());
    }

    #[test]
    fn test_customer_access_scoping() {
        let field = CallerContext::new("agent-7", AgentRole::FieldAgent);
        assert!(field.can_access_customer("agent-7"));
        assert!(!field.can_access_customer("agent-9"));

        let supervisor = CallerContext::new("sup-1", AgentRole::Supervisor);
        assert!(supervisor.can_access_customer("agent-9"));
    }
}
