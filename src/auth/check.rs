//! Per-resource authorization: identity, role and internal-call gating.

use super::{Caller, InternalCall};
use crate::error::AppError;
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Access policy declared by one resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRule {
    pub requires_auth: bool,
    /// Empty means any authenticated role.
    pub allowed_roles: BTreeSet<String>,
    pub protect_reads: bool,
    pub expose_internal_call: bool,
}

impl Default for AccessRule {
    fn default() -> Self {
        AccessRule {
            requires_auth: true,
            allowed_roles: BTreeSet::new(),
            protect_reads: false,
            expose_internal_call: false,
        }
    }
}

/// Reads skip the check unless `protect_reads`. A trusted internal call bypasses the role check
/// only; the caller must still carry an identity when the resource requires auth.
pub fn authorize(rule: &AccessRule, op: Operation, caller: &Caller) -> Result<(), AppError> {
    if !op.is_mutation() && !rule.protect_reads {
        return Ok(());
    }

    if caller.internal_call.is_present() && !rule.expose_internal_call {
        return Err(AppError::Unauthorized(
            "internal calls are not allowed for this resource".into(),
        ));
    }
    if caller.internal_call == InternalCall::Rejected {
        return Err(AppError::Unauthorized("invalid internal call token".into()));
    }

    if rule.requires_auth && caller.identity.is_none() {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }

    if rule.allowed_roles.is_empty() || caller.internal_call == InternalCall::Trusted {
        return Ok(());
    }
    match &caller.identity {
        None => Err(AppError::Unauthorized("Unauthorized".into())),
        Some(identity) if rule.allowed_roles.contains(&identity.role) => Ok(()),
        Some(identity) => Err(AppError::Forbidden(format!(
            "Forbidden: role '{}' cannot {} this resource",
            identity.role,
            op.as_str()
        ))),
    }
}
