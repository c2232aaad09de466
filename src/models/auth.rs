use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Fleet Manager")]
    FleetManager,
    Dispatcher,
    #[serde(rename = "Safety Officer")]
    SafetyOfficer,
    #[serde(rename = "Financial Analyst")]
    FinancialAnalyst,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FleetManager => "Fleet Manager",
            Role::Dispatcher => "Dispatcher",
            Role::SafetyOfficer => "Safety Officer",
            Role::FinancialAnalyst => "Financial Analyst",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Fleet Manager" => Some(Role::FleetManager),
            "Dispatcher" => Some(Role::Dispatcher),
            "Safety Officer" => Some(Role::SafetyOfficer),
            "Financial Analyst" => Some(Role::FinancialAnalyst),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usuario autenticado que se inyecta en los handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}
