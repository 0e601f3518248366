use crate::entities::Role;
use crate::error::{AppError, AppResult};
use crate::models::CurrentUser;

/// 授权判定结果，拒绝必须带原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NoRoleProfile,
    RoleMismatch { required: Role },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::Unauthenticated => write!(f, "authentication required"),
            DenyReason::NoRoleProfile => write!(f, "no role profile"),
            DenyReason::RoleMismatch { required } => write!(f, "requires {required} role"),
        }
    }
}

/// 显式角色检查。缺失角色资料是普通的拒绝，不走异常
pub fn check_role(principal: Option<&CurrentUser>, required: Role) -> AccessDecision {
    let Some(user) = principal else {
        return AccessDecision::Deny(DenyReason::Unauthenticated);
    };

    match &user.role {
        None => AccessDecision::Deny(DenyReason::NoRoleProfile),
        Some(role) if *role == required => AccessDecision::Allow,
        Some(_) => AccessDecision::Deny(DenyReason::RoleMismatch { required }),
    }
}

/// 角色闸门：通过时返回主体 ID，拒绝时映射为 401/403
pub fn require_role(principal: Option<&CurrentUser>, required: Role) -> AppResult<i64> {
    let Some(user) = principal else {
        return Err(AppError::AuthError("Authentication required".to_string()));
    };

    match check_role(Some(user), required) {
        AccessDecision::Allow => Ok(user.id),
        AccessDecision::Deny(reason) => Err(AppError::Forbidden(reason.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeker() -> CurrentUser {
        CurrentUser {
            id: 1,
            role: Some(Role::Seeker),
        }
    }

    #[test]
    fn test_allow_matching_role() {
        assert_eq!(check_role(Some(&seeker()), Role::Seeker), AccessDecision::Allow);
    }

    #[test]
    fn test_deny_unauthenticated() {
        assert_eq!(
            check_role(None, Role::Seeker),
            AccessDecision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_deny_missing_role_profile() {
        let user = CurrentUser { id: 7, role: None };
        assert_eq!(
            check_role(Some(&user), Role::Facilitator),
            AccessDecision::Deny(DenyReason::NoRoleProfile)
        );
    }

    #[test]
    fn test_deny_role_mismatch() {
        assert_eq!(
            check_role(Some(&seeker()), Role::Facilitator),
            AccessDecision::Deny(DenyReason::RoleMismatch {
                required: Role::Facilitator
            })
        );
    }

    #[test]
    fn test_require_role_maps_denies() {
        assert!(matches!(
            require_role(None, Role::Seeker),
            Err(AppError::AuthError(_))
        ));
        assert!(matches!(
            require_role(Some(&seeker()), Role::Facilitator),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(require_role(Some(&seeker()), Role::Seeker).unwrap(), 1);
    }
}
