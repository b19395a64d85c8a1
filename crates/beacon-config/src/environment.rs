//! Process environment read once at startup.

use std::env;

/// Values the beacon reads from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `HOSTNAME`, empty when unset.
    pub host_name: String,

    /// `DEPLOYMENT_GROUP`, when set and non-empty.
    pub deployment_group: Option<String>,
}

impl Environment {
    /// Reads the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the environment from an arbitrary lookup.
    ///
    /// # Example
    ///
    /// ```
    /// use beacon_config::Environment;
    ///
    /// let env = Environment::from_lookup(|key| match key {
    ///     "HOSTNAME" => Some("beacon-0".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(env.host_name, "beacon-0");
    /// assert!(env.deployment_group.is_none());
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host_name: lookup("HOSTNAME").unwrap_or_default(),
            deployment_group: lookup("DEPLOYMENT_GROUP").filter(|group| !group.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("HOSTNAME", "beacon-1"), ("DEPLOYMENT_GROUP", "blue")]);
        let env = Environment::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(env.host_name, "beacon-1");
        assert_eq!(env.deployment_group.as_deref(), Some("blue"));
    }

    #[test]
    fn test_missing_values() {
        let env = Environment::from_lookup(|_| None);
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn test_empty_deployment_group_ignored() {
        let env = Environment::from_lookup(|key| {
            (key == "DEPLOYMENT_GROUP").then(String::new)
        });
        assert!(env.deployment_group.is_none());
    }
}
