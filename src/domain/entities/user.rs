use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to an HR service account.
///
/// Roles gate access to protected endpoints: every authenticated user holds
/// at least one role, and role checks happen after authentication succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hr,
    Employee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Hr => write!(f, "hr"),
            Self::Employee => write!(f, "employee"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "hr" => Ok(Self::Hr),
            "employee" => Ok(Self::Employee),
            _ => Err(format!("Invalid role: {s}. Valid values: admin, hr, employee")),
        }
    }
}

/// A stored service account.
///
/// Employee profile data (attendance, advances, loans, designations) lives in
/// the external persistence layer; this record carries only what the
/// authentication pipeline needs.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

impl UserRecord {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("ADMIN", Role::Admin)]
    #[case("Hr", Role::Hr)]
    #[case("hr", Role::Hr)]
    #[case("employee", Role::Employee)]
    fn test_role_parse(#[case] input: &str, #[case] expected: Role) {
        assert_eq!(input.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Hr, Role::Employee] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_parse_invalid() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(err.contains("Invalid role"));
    }

    #[test]
    fn test_user_record_role_checks() {
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            password_hash: "irrelevant".to_string(),
            roles: vec![Role::Hr, Role::Employee],
        };

        assert!(user.has_role(Role::Hr));
        assert!(!user.has_role(Role::Admin));
        assert!(user.has_any_role(&[Role::Admin, Role::Employee]));
        assert!(!user.has_any_role(&[Role::Admin]));
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let role: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(role, Role::Employee);
    }
}
