use ::config::{ConfigBuilder, Environment, File, builder::DefaultState};
use depot_scope::{Key, Scope};
use serde::{Deserialize, de::DeserializeOwned};
use std::{path::PathBuf, sync::Arc};
use validator::Validate;

/// Scope binding for the active registry configuration.
pub const CONFIG: Key<Arc<RegistryConfig>> = Key::new("config");

/// Loads a config from an optional `<dir>/<NAME>.{yaml,toml,json}` file,
/// overlaid with `<ENV>_`-prefixed environment variables, then validates it.
pub trait NewForConfig
where
    Self: Sized + DeserializeOwned + Validate, {
    const NAME: &'static str;
    const ENV: &'static str;

    /// Keys whose environment value is a comma separated list.
    const LIST_KEYS: &'static [&'static str] = &[];

    fn new<S: AsRef<str>>(dir: Option<S>) -> crate::Result<Self> {
        let file_name = format!(
            "{}",
            PathBuf::from(
                dir.map(|s| String::from(s.as_ref()))
                    .unwrap_or("./".into())
            )
            .join(Self::NAME)
            .display()
        );

        let mut env = Environment::with_prefix(Self::ENV)
            .try_parsing(true)
            .list_separator(",");
        for key in Self::LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let this: Self = ConfigBuilder::<DefaultState>::default()
            .add_source(File::with_name(&file_name).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        this.validate()?;

        tracing::debug!(file = %file_name, "loaded {} config", Self::NAME);
        Ok(this)
    }
}

fn default_primary_site_url() -> String {
    "http://localhost:8080/".into()
}

fn default_search_service_url() -> String {
    "http://localhost:8081/".into()
}

fn default_page_size() -> usize {
    10
}

#[derive(Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct RegistryConfig {
    /// Public address of the registry frontend
    #[validate(url)]
    #[serde(default = "default_primary_site_url")]
    pub primary_site_url: String,

    #[validate(url)]
    #[serde(default = "default_search_service_url")]
    pub search_service_url: String,

    #[serde(default)]
    pub admin_emails: Vec<String>,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl NewForConfig for RegistryConfig {
    const NAME: &'static str = "registry";
    const ENV: &'static str = "DEPOT";
    const LIST_KEYS: &'static [&'static str] = &["admin_emails"];
}

impl RegistryConfig {
    pub fn load<S: AsRef<str>>(dir: Option<S>) -> crate::Result<Self> {
        Self::new(dir)
    }

    /// In-memory configuration for in-process registries.
    pub fn fake() -> Self {
        Self {
            primary_site_url: default_primary_site_url(),
            search_service_url: default_search_service_url(),
            admin_emails: vec!["admin@example.com".to_string()],
            default_page_size: default_page_size(),
        }
    }

    pub fn is_admin(
        &self,
        email: &str,
    ) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

/// Resolves the configuration bound in `scope`, falling back to
/// [`RegistryConfig::fake`] when none is bound.
pub fn registry_config(scope: &Scope) -> Arc<RegistryConfig> {
    scope
        .get(&CONFIG)
        .unwrap_or_else(|| Arc::new(RegistryConfig::fake()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_dir(
        name: &str,
        contents: &str,
    ) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("depot-config-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("registry.yaml"), contents).unwrap();
        dir
    }

    #[test]
    fn loads_file_over_defaults() {
        let dir = config_dir(
            "valid",
            "default_page_size: 25\nadmin_emails:\n  - Root@Example.com\n",
        );

        let config = RegistryConfig::load(Some(dir.to_string_lossy())).unwrap();

        assert_eq!(config.default_page_size, 25);
        assert!(config.is_admin("root@example.com"));
        assert_eq!(config.search_service_url, "http://localhost:8081/");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("depot-config-missing-dir");

        let config = RegistryConfig::load(Some(dir.to_string_lossy())).unwrap();

        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn rejects_invalid_page_size() {
        let dir = config_dir("invalid", "default_page_size: 0\n");

        assert!(matches!(
            RegistryConfig::load(Some(dir.to_string_lossy())),
            Err(crate::Error::ValidationErrors(_))
        ));
    }

    #[test]
    fn rejects_invalid_urls() {
        let dir = config_dir("bad-url", "search_service_url: not a url\n");

        assert!(matches!(
            RegistryConfig::load(Some(dir.to_string_lossy())),
            Err(crate::Error::ValidationErrors(_))
        ));
    }

    #[test]
    fn fake_config_is_valid() {
        assert!(RegistryConfig::fake().validate().is_ok());
    }
}
