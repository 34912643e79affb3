use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use taskhub_core::AppError;
use taskhub_domain::{DEFAULT_MAX_UPLOAD_BYTES, ProjectWritePolicy};
use tracing_subscriber::EnvFilter;

/// Credentials for the administrator seeded at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub cookie_secure: bool,
    pub session_idle_minutes: i64,
    pub project_write_policy: ProjectWritePolicy,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_host = value("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or("API_PORT", value("API_PORT"), 3001_u16)?;
        let frontend_url = value("FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let cookie_secure = value("SESSION_COOKIE_SECURE")
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));

        let session_idle_minutes =
            parse_or("SESSION_IDLE_MINUTES", value("SESSION_IDLE_MINUTES"), 30_i64)?;
        if session_idle_minutes <= 0 {
            return Err(AppError::Validation(
                "SESSION_IDLE_MINUTES must be positive".to_owned(),
            ));
        }

        let project_write_policy = value("PROJECT_WRITE_POLICY")
            .map(|policy| ProjectWritePolicy::from_str(policy.trim()))
            .transpose()?
            .unwrap_or_default();

        let upload_dir = value("UPLOAD_DIR").map_or_else(|| PathBuf::from("./data"), PathBuf::from);
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            value("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        if max_upload_bytes == 0 {
            return Err(AppError::Validation(
                "MAX_UPLOAD_BYTES must be positive".to_owned(),
            ));
        }

        let bootstrap_admin = match (
            value("BOOTSTRAP_ADMIN_USERNAME"),
            value("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_owned(),
                ));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            cookie_secure,
            session_idle_minutes,
            project_write_policy,
            upload_dir,
            max_upload_bytes,
            bootstrap_admin,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{raw}': {error}")))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use taskhub_core::{AppError, AppResult};
    use taskhub_domain::ProjectWritePolicy;

    use super::ApiConfig;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() -> AppResult<()> {
        let config = config_from(&[])?;

        assert_eq!(config.socket_address()?.to_string(), "127.0.0.1:3001");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.project_write_policy, ProjectWritePolicy::Permissive);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.session_idle_minutes, 30);
        assert!(!config.cookie_secure);
        assert!(config.bootstrap_admin.is_none());
        Ok(())
    }

    #[test]
    fn explicit_values_are_parsed() -> AppResult<()> {
        let config = config_from(&[
            ("API_PORT", "8080"),
            ("FRONTEND_URL", "https://tasks.example.com/"),
            ("SESSION_COOKIE_SECURE", "TRUE"),
            ("PROJECT_WRITE_POLICY", "creator_only"),
            ("MAX_UPLOAD_BYTES", "2048"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "correct horse battery"),
        ])?;

        assert_eq!(config.api_port, 8080);
        assert_eq!(config.frontend_url, "https://tasks.example.com");
        assert!(config.cookie_secure);
        assert_eq!(config.project_write_policy, ProjectWritePolicy::CreatorOnly);
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(
            config.bootstrap_admin.map(|admin| admin.username),
            Some("root".to_owned())
        );
        Ok(())
    }

    #[test]
    fn invalid_values_fail_fast() {
        for pairs in [
            vec![("API_PORT", "not-a-port")],
            vec![("PROJECT_WRITE_POLICY", "anything_goes")],
            vec![("MAX_UPLOAD_BYTES", "0")],
            vec![("SESSION_IDLE_MINUTES", "-5")],
            vec![("BOOTSTRAP_ADMIN_USERNAME", "root")],
        ] {
            assert!(
                matches!(config_from(&pairs), Err(AppError::Validation(_))),
                "{pairs:?} should be rejected"
            );
        }
    }
}
