mod package;
mod publisher;
mod report;
mod user;
mod version;

pub use package::Package;
pub use publisher::Publisher;
pub use report::VersionReport;
pub use user::User;
pub use version::PackageVersion;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every record kind persisted by the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum Entity {
    User(User),
    Publisher(Publisher),
    Package(Package),
    Version(PackageVersion),
    Report(VersionReport),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Publisher,
    Package,
    Version,
    Report,
}

/// Primary key of a single record. Ordered by kind, then identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKey {
    User(String),
    Publisher(String),
    Package(String),
    Version { package: String, version: String },
    Report { package: String, version: String },
}

impl EntityKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::User(_) => EntityKind::User,
            EntityKey::Publisher(_) => EntityKind::Publisher,
            EntityKey::Package(_) => EntityKind::Package,
            EntityKey::Version { .. } => EntityKind::Version,
            EntityKey::Report { .. } => EntityKind::Report,
        }
    }

    pub fn version(
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        EntityKey::Version {
            package: package.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            EntityKey::User(id) => write!(f, "user:{id}"),
            EntityKey::Publisher(id) => write!(f, "publisher:{id}"),
            EntityKey::Package(name) => write!(f, "package:{name}"),
            EntityKey::Version { package, version } => write!(f, "version:{package}@{version}"),
            EntityKey::Report { package, version } => write!(f, "report:{package}@{version}"),
        }
    }
}

impl Entity {
    pub fn key(&self) -> EntityKey {
        match self {
            Entity::User(user) => EntityKey::User(user.id.clone()),
            Entity::Publisher(publisher) => EntityKey::Publisher(publisher.id.clone()),
            Entity::Package(package) => EntityKey::Package(package.name.clone()),
            Entity::Version(version) => {
                EntityKey::Version {
                    package: version.package.clone(),
                    version: version.version.clone(),
                }
            },
            Entity::Report(report) => {
                EntityKey::Report {
                    package: report.package.clone(),
                    version: report.version.clone(),
                }
            },
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.key().kind()
    }

    /// Field level checks applied before a record is written.
    ///
    /// Cross-record references are not checked here; that is the job of
    /// [`crate::integrity::IntegrityChecker`].
    pub fn validate(&self) -> Result<()> {
        let key = self.key();

        let identifiers: Vec<&str> = match &key {
            EntityKey::User(id) | EntityKey::Publisher(id) | EntityKey::Package(id) => vec![id.as_str()],
            EntityKey::Version { package, version } | EntityKey::Report { package, version } => {
                vec![package.as_str(), version.as_str()]
            },
        };
        if identifiers
            .iter()
            .any(|id| id.trim().is_empty())
        {
            return Err(Error::Validation(format!("{key} has an empty identifier")));
        }

        match self {
            Entity::Package(package) => {
                parse_version(&package.latest_version)?;
            },
            Entity::Version(version) => {
                parse_version(&version.version)?;
            },
            Entity::Report(report) => {
                parse_version(&report.version)?;
                if report.granted_points > report.max_points {
                    return Err(Error::Validation(format!(
                        "{key} grants {} of {} points",
                        report.granted_points, report.max_points
                    )));
                }
            },
            Entity::User(user) => {
                if !user.email.contains('@') {
                    return Err(Error::Validation(format!(
                        "{key} has invalid email `{}`",
                        user.email
                    )));
                }
            },
            Entity::Publisher(_) => {},
        }

        Ok(())
    }
}

pub(crate) fn parse_version(version: &str) -> Result<semver::Version> {
    semver::Version::parse(version).map_err(|source| {
        Error::InvalidVersion {
            version: version.to_string(),
            source,
        }
    })
}

macro_rules! entity_conversions {
    ($($variant: ident => $ty: ty),* $(,)?) => {
        $(
            impl From<$ty> for Entity {
                fn from(value: $ty) -> Self {
                    Entity::$variant(value)
                }
            }

            impl TryFrom<Entity> for $ty {
                type Error = Entity;

                fn try_from(value: Entity) -> std::result::Result<Self, Self::Error> {
                    match value {
                        Entity::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

entity_conversions! {
    User => User,
    Publisher => Publisher,
    Package => Package,
    Version => PackageVersion,
    Report => VersionReport,
}

/// Keeps only the records of type `T`.
pub(crate) fn typed<T>(entities: Vec<Entity>) -> Vec<T>
where
    T: TryFrom<Entity>, {
    entities
        .into_iter()
        .filter_map(|entity| T::try_from(entity).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn keys_order_by_kind_then_identifier() {
        let mut keys = vec![
            EntityKey::version("b", "1.0.0"),
            EntityKey::Package("b".into()),
            EntityKey::User("u1".into()),
            EntityKey::Package("a".into()),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                EntityKey::User("u1".into()),
                EntityKey::Package("a".into()),
                EntityKey::Package("b".into()),
                EntityKey::version("b", "1.0.0"),
            ]
        );
    }

    #[test]
    fn key_display_is_readable() {
        assert_eq!(EntityKey::version("neon", "1.0.0").to_string(), "version:neon@1.0.0");
    }

    #[test]
    fn validate_rejects_bad_versions() {
        let version: Entity = fixtures::version("neon")
            .version("not-a-version")
            .build()
            .into();

        assert!(matches!(
            version.validate(),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_identifiers() {
        let package: Entity = fixtures::package().name(" ").build().into();

        assert!(matches!(package.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn conversions_round_trip_through_entity() {
        let user = fixtures::user().email("a@example.com").build();
        let entity = Entity::from(user.clone());

        assert_eq!(entity.kind(), EntityKind::User);
        assert_eq!(User::try_from(entity).unwrap(), user);
    }
}
