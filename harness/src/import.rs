//! Turns a [`TestProfile`] into datastore entities.

use crate::{
    Error, Result,
    populate::{Baseline, populate},
    profile::{ProfilePackage, TestProfile, user_id},
};
use chrono::{DateTime, Duration, Utc};
use depot_registry_db::entities::{Entity, Package, PackageVersion, Publisher, User, VersionReport};
use depot_scope::Scope;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

/// Per-version metadata a profile does not carry itself.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionMeta {
    pub description: String,
    pub dependencies: BTreeMap<String, String>,
    pub published: DateTime<Utc>,
    pub granted_points: u32,
    pub max_points: u32,
    pub tags: Vec<String>,
}

/// Where imported package content comes from.
pub trait ImportSource: Send + Sync {
    /// Versions imported for a package whose profile entry lists none.
    fn default_versions(
        &self,
        package: &str,
    ) -> Vec<String>;

    fn version_meta(
        &self,
        package: &str,
        version: &semver::Version,
    ) -> VersionMeta;
}

/// Deterministic generated content: the same profile always imports to the
/// same entities.
#[derive(Debug, Clone)]
pub struct AutoGeneratedSource {
    /// Publication time of `0.0.0`; later versions are published later.
    pub epoch: DateTime<Utc>,
}

impl Default for AutoGeneratedSource {
    fn default() -> Self {
        Self {
            // 2024-01-01T00:00:00Z
            epoch: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
        }
    }
}

pub fn auto_generated() -> Arc<dyn ImportSource> {
    Arc::new(AutoGeneratedSource::default())
}

impl ImportSource for AutoGeneratedSource {
    fn default_versions(
        &self,
        _: &str,
    ) -> Vec<String> {
        vec!["1.0.0".to_string()]
    }

    fn version_meta(
        &self,
        package: &str,
        version: &semver::Version,
    ) -> VersionMeta {
        let days = version
            .major
            .saturating_mul(100)
            .saturating_add(version.minor.saturating_mul(10))
            .saturating_add(version.patch);
        let checksum: u32 = package.bytes().map(u32::from).sum();

        VersionMeta {
            description: format!("{package} is an auto-generated package for testing."),
            dependencies: BTreeMap::new(),
            published: self.epoch + Duration::days(days.min(10_000) as i64),
            granted_points: 100 + checksum % 41,
            max_points: 140,
            tags: vec!["is:auto-generated".to_string()],
        }
    }
}

fn parse_version(version: &str) -> Result<semver::Version> {
    semver::Version::parse(version).map_err(|source| {
        Error::InvalidVersion {
            version: version.to_string(),
            source,
        }
    })
}

/// Highest stable version, or the highest prerelease when there is no
/// stable one.
fn latest(versions: &[semver::Version]) -> Option<&semver::Version> {
    versions
        .iter()
        .filter(|v| v.pre.is_empty())
        .max()
        .or_else(|| versions.iter().max())
}

struct Resolver<'p> {
    profile: &'p TestProfile,
    users: BTreeSet<String>,
}

impl<'p> Resolver<'p> {
    fn new(profile: &'p TestProfile) -> Self {
        Self {
            profile,
            users: BTreeSet::new(),
        }
    }

    fn user(
        &mut self,
        email: &str,
    ) -> String {
        self.users.insert(email.to_string());
        user_id(email)
    }

    fn default_user(
        &mut self,
        what: &str,
    ) -> Result<String> {
        let email = self
            .profile
            .default_user
            .clone()
            .ok_or_else(|| Error::Profile(format!("{what} needs a default_user")))?;

        Ok(self.user(&email))
    }

    fn publishers(&mut self) -> Result<Vec<Publisher>> {
        let profile = self.profile;
        let mut publishers = Vec::new();

        for publisher in &profile.publishers {
            let members = if publisher.members.is_empty() {
                vec![self.default_user(&format!("publisher `{}`", publisher.id))?]
            } else {
                publisher
                    .members
                    .iter()
                    .map(|email| self.user(email))
                    .collect()
            };

            publishers.push(Publisher {
                id: publisher.id.clone(),
                contact_email: format!("admin@{}", publisher.id),
                members,
            });
        }

        Ok(publishers)
    }

    fn package(
        &mut self,
        package: &ProfilePackage,
        source: &dyn ImportSource,
        likes: u32,
    ) -> Result<(Package, Vec<PackageVersion>, Vec<VersionReport>)> {
        let names = if package.versions.is_empty() {
            source.default_versions(&package.name)
        } else {
            package.versions.clone()
        };

        let mut versions = names
            .iter()
            .map(|v| parse_version(v))
            .collect::<Result<Vec<_>>>()?;
        versions.sort();
        versions.dedup();

        let latest = latest(&versions)
            .ok_or_else(|| Error::Profile(format!("package `{}` has no versions", package.name)))?
            .to_string();

        if let Some(publisher) = &package.publisher {
            if !self
                .profile
                .publishers
                .iter()
                .any(|p| &p.id == publisher)
            {
                return Err(Error::Profile(format!(
                    "package `{}` names unknown publisher `{publisher}`",
                    package.name
                )));
            }
        }

        let mut uploaders: Vec<String> = package
            .uploaders
            .iter()
            .map(|email| self.user(email))
            .collect();
        if uploaders.is_empty() && package.publisher.is_none() {
            uploaders.push(self.default_user(&format!("package `{}`", package.name))?);
        }

        let uploader = match uploaders.first() {
            Some(id) => Some(id.clone()),
            None if self.profile.default_user.is_some() => {
                Some(self.default_user(&format!("package `{}`", package.name))?)
            },
            None => None,
        };

        let mut records = Vec::new();
        let mut reports = Vec::new();
        let mut created = None;

        for version in &versions {
            let meta = source.version_meta(&package.name, version);
            created.get_or_insert(meta.published);

            records.push(PackageVersion {
                package: package.name.clone(),
                version: version.to_string(),
                description: meta.description,
                dependencies: meta.dependencies,
                uploader: uploader.clone(),
                published: meta.published,
            });
            reports.push(VersionReport {
                package: package.name.clone(),
                version: version.to_string(),
                granted_points: meta.granted_points.min(meta.max_points),
                max_points: meta.max_points,
                tags: meta.tags,
            });
        }

        let record = Package {
            name: package.name.clone(),
            publisher_id: package.publisher.clone(),
            uploaders,
            latest_version: latest,
            is_discontinued: package.discontinued,
            likes,
            created: created.unwrap_or_else(Utc::now),
        };

        Ok((record, records, reports))
    }
}

/// Resolves `profile` against `source` into a [`Baseline`].
pub fn materialize(
    profile: &TestProfile,
    source: &dyn ImportSource,
) -> Result<Baseline> {
    let mut seen = BTreeSet::new();
    for package in &profile.packages {
        if !seen.insert(package.name.as_str()) {
            return Err(Error::Profile(format!(
                "package `{}` is listed twice",
                package.name
            )));
        }
    }

    let mut likes: HashMap<&str, u32> = HashMap::new();
    for user in &profile.users {
        for liked in &user.likes {
            if !seen.contains(liked.as_str()) {
                return Err(Error::Profile(format!(
                    "user `{}` likes unknown package `{liked}`",
                    user.email
                )));
            }
            *likes.entry(liked.as_str()).or_default() += 1;
        }
    }

    let mut resolver = Resolver::new(profile);
    for user in &profile.users {
        resolver.user(&user.email);
    }

    let mut entities: Vec<Entity> = resolver
        .publishers()?
        .into_iter()
        .map(Entity::from)
        .collect();
    let mut reports = Vec::new();

    for package in &profile.packages {
        let liked = likes
            .get(package.name.as_str())
            .copied()
            .unwrap_or_default();
        let (record, versions, package_reports) = resolver.package(package, source, liked)?;

        entities.push(record.into());
        entities.extend(versions.into_iter().map(Entity::from));
        reports.extend(package_reports);
    }

    entities.extend(resolver.users.iter().map(|email| {
        Entity::from(User {
            id: user_id(email),
            email: email.clone(),
        })
    }));

    let most_liked = likes.values().copied().max().unwrap_or_default();
    let popularity = profile
        .packages
        .iter()
        .map(|package| {
            let liked = likes
                .get(package.name.as_str())
                .copied()
                .unwrap_or_default();
            let score = if most_liked == 0 {
                0.0
            } else {
                f64::from(liked) / f64::from(most_liked)
            };
            (package.name.clone(), score)
        })
        .collect();

    Ok(Baseline {
        entities,
        reports,
        popularity,
    })
}

/// Imports `profile` into the datastore and search index bound in `scope`.
pub async fn import_profile(
    scope: &Scope,
    profile: &TestProfile,
    source: &dyn ImportSource,
) -> Result<Baseline> {
    let baseline = materialize(profile, source)?;
    populate(scope, &baseline).await?;

    tracing::info!(
        packages = profile.packages.len(),
        users = baseline.users().count(),
        "imported test profile"
    );
    Ok(baseline)
}
