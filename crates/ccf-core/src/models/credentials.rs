use std::fmt;

const MASK: &str = "********";

/// Archive account credentials.
///
/// `Debug` and `Display` never print the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &MASK)
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_masked() {
        let creds = Credentials::new("tbbrown", "s3cret-pa55");
        let debug = format!("{:?}", creds);
        let display = creds.to_string();
        assert!(!debug.contains("s3cret-pa55"));
        assert!(!display.contains("s3cret-pa55"));
        assert!(debug.contains("tbbrown"));
        assert_eq!(display, "tbbrown:********");
        assert_eq!(creds.password(), "s3cret-pa55");
    }
}
