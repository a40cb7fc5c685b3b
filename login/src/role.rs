use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumString;

/// Role the backend assigns to an account. Drives which parts of the
/// marketplace a front-end should expose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    User,
    Realtor,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Realtors and admins may create and edit listings.
    pub fn can_manage_listings(self) -> bool {
        matches!(self, Role::Realtor | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    #[expect(clippy::unwrap_used)]
    fn parses_wire_names_case_insensitively() {
        assert_eq!(Role::from_str("REALTOR").unwrap(), Role::Realtor);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert!(Role::from_str("MODERATOR").is_err());
        assert_eq!(Role::User.to_string(), "USER");
    }

    #[test]
    #[expect(clippy::unwrap_used)]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&Role::Realtor).unwrap();
        assert_eq!(json, "\"REALTOR\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn only_realtors_and_admins_manage_listings() {
        assert!(!Role::User.can_manage_listings());
        assert!(Role::Realtor.can_manage_listings());
        assert!(Role::Admin.can_manage_listings());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Realtor.is_admin());
    }
}
