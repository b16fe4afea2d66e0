//! Declarative baseline datasets.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Baseline entities seeded before a test body runs.
///
/// Users are identified by email; their datastore id (and bearer token) is
/// [`user_id`] of that email. Users referenced anywhere in the profile are
/// created even when they are not listed under `users`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, bon::Builder)]
#[serde(rename_all = "snake_case")]
pub struct TestProfile {
    #[serde(default)]
    #[builder(default)]
    pub packages: Vec<ProfilePackage>,

    #[serde(default)]
    #[builder(default)]
    pub publishers: Vec<ProfilePublisher>,

    #[serde(default)]
    #[builder(default)]
    pub users: Vec<ProfileUser>,

    /// Uploader of packages that name neither a publisher nor uploaders
    #[builder(into)]
    pub default_user: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, bon::Builder)]
#[serde(rename_all = "snake_case")]
pub struct ProfilePackage {
    #[builder(into)]
    pub name: String,

    /// Versions to import; the import source decides when empty
    #[serde(default)]
    #[builder(default)]
    pub versions: Vec<String>,

    #[builder(into)]
    pub publisher: Option<String>,

    /// Uploader emails
    #[serde(default)]
    #[builder(default)]
    pub uploaders: Vec<String>,

    #[serde(default)]
    #[builder(default)]
    pub discontinued: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, bon::Builder)]
#[serde(rename_all = "snake_case")]
pub struct ProfilePublisher {
    #[builder(into)]
    pub id: String,

    /// Member emails
    #[serde(default)]
    #[builder(default)]
    pub members: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, bon::Builder)]
#[serde(rename_all = "snake_case")]
pub struct ProfileUser {
    #[builder(into)]
    pub email: String,

    /// Names of liked packages
    #[serde(default)]
    #[builder(default)]
    pub likes: Vec<String>,
}

/// Datastore id of the profile user with `email`.
pub fn user_id(email: &str) -> String {
    let slug: String = email
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    format!("user-{slug}")
}

fn strings<const N: usize>(values: [&str; N]) -> Vec<String> {
    values
        .into_iter()
        .map(String::from)
        .collect()
}

impl TestProfile {
    pub const DEFAULT_USER: &'static str = "admin@example.com";

    /// Three packages, one publisher and two users.
    pub fn default_profile() -> Self {
        Self {
            packages: vec![
                ProfilePackage {
                    name: "neon".into(),
                    versions: strings(["1.0.0", "2.0.0"]),
                    publisher: Some("example.com".into()),
                    uploaders: vec![],
                    discontinued: false,
                },
                ProfilePackage {
                    name: "oxygen".into(),
                    versions: strings(["1.0.0", "1.2.0", "2.0.0-dev"]),
                    publisher: None,
                    uploaders: vec![],
                    discontinued: false,
                },
                ProfilePackage {
                    name: "flutter_titanium".into(),
                    versions: strings(["1.9.0", "1.10.0"]),
                    publisher: Some("example.com".into()),
                    uploaders: vec![],
                    discontinued: false,
                },
            ],
            publishers: vec![ProfilePublisher {
                id: "example.com".into(),
                members: strings([Self::DEFAULT_USER]),
            }],
            users: vec![
                ProfileUser {
                    email: Self::DEFAULT_USER.into(),
                    likes: strings(["neon", "oxygen"]),
                },
                ProfileUser {
                    email: "user@example.com".into(),
                    likes: strings(["neon"]),
                },
            ],
            default_user: Some(Self::DEFAULT_USER.into()),
        }
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn package(
        &self,
        name: &str,
    ) -> Option<&ProfilePackage> {
        self.packages
            .iter()
            .find(|package| package.name == name)
    }
}
