use super::resolver::DEFAULT_ACTION_SUFFIX;

/// Module owning the framework's built-in actions.
pub const FRAMEWORK_MODULE: &str = "actiongate";

/// Server-level configuration for the action registry and pipeline.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Module id under which built-in actions are published.
    pub module_id: String,
    /// Suffix every action type name must end with.
    pub action_suffix: String,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            module_id: FRAMEWORK_MODULE.to_string(),
            action_suffix: DEFAULT_ACTION_SUFFIX.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

/// Sources of the caller identity. Both unset means every caller is anonymous.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Header set by an authenticating proxy, e.g. `x-remote-user`.
    pub remote_user_header: Option<String>,
    /// HS256 secret for bearer tokens.
    pub jwt_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.module_id, "actiongate");
        assert_eq!(config.action_suffix, "Action");
        assert!(config.auth.remote_user_header.is_none());
        assert!(config.auth.jwt_secret.is_none());
    }
}
