use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry in the chat transcript. Turns are immutable once created; the
/// position inside a [`crate::core::conversation::Conversation`] is the only
/// ordering information they carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Role name used in Gemini `contents`. System turns travel through
    /// `systemInstruction` instead and have no content role.
    pub fn to_api_role(self) -> Option<&'static str> {
        match self {
            Role::User => Some("user"),
            Role::Assistant => Some("model"),
            Role::System => None,
        }
    }

}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for Role {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_maps_to_model_role() {
        assert_eq!(Role::Assistant.to_api_role(), Some("model"));
        assert_eq!(Role::User.to_api_role(), Some("user"));
        assert_eq!(Role::System.to_api_role(), None);
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("tool").is_err());
        assert!(Role::try_from("model").is_err());
    }

    #[test]
    fn turns_serialize_with_string_roles() {
        let json = serde_json::to_string(&Turn::user("Hi")).expect("serialize");
        assert_eq!(json, r#"{"role":"user","text":"Hi"}"#);
        let turn: Turn =
            serde_json::from_str(r#"{"role":"assistant","text":"Hello!"}"#).expect("parse");
        assert_eq!(turn, Turn::assistant("Hello!"));
    }
}
