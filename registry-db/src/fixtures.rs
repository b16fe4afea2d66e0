//! Test fixtures for registry-db tests
//!
//! Provides fluent builder-style fixtures for creating test data.
//! Each fixture generates unique defaults using atomic counters.
//!
//! This module is only available when the `test` feature is enabled.

use crate::{Datastore, Result, entities::*};
use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, Ordering},
};

// Atomic counters for unique test data generation
static USER_COUNTER: AtomicI64 = AtomicI64::new(1);
static PUBLISHER_COUNTER: AtomicI64 = AtomicI64::new(1);
static PACKAGE_COUNTER: AtomicI64 = AtomicI64::new(1);

fn next_user_n() -> i64 {
    USER_COUNTER.fetch_add(1, Ordering::SeqCst)
}

fn next_publisher_n() -> i64 {
    PUBLISHER_COUNTER.fetch_add(1, Ordering::SeqCst)
}

fn next_package_n() -> i64 {
    PACKAGE_COUNTER.fetch_add(1, Ordering::SeqCst)
}

async fn store<T>(
    db: &dyn Datastore,
    record: T,
) -> Result<T>
where
    T: Clone + Into<Entity>, {
    db.commit(vec![record.clone().into()])
        .await?;
    Ok(record)
}

pub struct UserFixture {
    id: Option<String>,
    email: Option<String>,
}

pub fn user() -> UserFixture {
    UserFixture {
        id: None,
        email: None,
    }
}

impl UserFixture {
    pub fn id(
        mut self,
        id: &str,
    ) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn email(
        mut self,
        email: &str,
    ) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn build(self) -> User {
        let n = next_user_n();

        User {
            id: self
                .id
                .unwrap_or_else(|| format!("test-user-{n}")),
            email: self
                .email
                .unwrap_or_else(|| format!("test-{n}@example.com")),
        }
    }

    pub async fn insert(
        self,
        db: &dyn Datastore,
    ) -> Result<User> {
        store(db, self.build()).await
    }
}

pub struct PublisherFixture {
    id: Option<String>,
    contact_email: Option<String>,
    members: Vec<String>,
}

pub fn publisher() -> PublisherFixture {
    PublisherFixture {
        id: None,
        contact_email: None,
        members: vec![],
    }
}

impl PublisherFixture {
    pub fn id(
        mut self,
        id: &str,
    ) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn contact_email(
        mut self,
        email: &str,
    ) -> Self {
        self.contact_email = Some(email.to_string());
        self
    }

    pub fn member(
        mut self,
        user_id: &str,
    ) -> Self {
        self.members.push(user_id.to_string());
        self
    }

    pub fn build(self) -> Publisher {
        let n = next_publisher_n();
        let id = self
            .id
            .unwrap_or_else(|| format!("publisher{n}.example.com"));

        Publisher {
            contact_email: self
                .contact_email
                .unwrap_or_else(|| format!("admin@{id}")),
            id,
            members: self.members,
        }
    }

    pub async fn insert(
        self,
        db: &dyn Datastore,
    ) -> Result<Publisher> {
        store(db, self.build()).await
    }
}

pub struct PackageFixture {
    name: Option<String>,
    publisher_id: Option<String>,
    uploaders: Vec<String>,
    latest_version: String,
    is_discontinued: bool,
    likes: u32,
    created: Option<DateTime<Utc>>,
}

pub fn package() -> PackageFixture {
    PackageFixture {
        name: None,
        publisher_id: None,
        uploaders: vec![],
        latest_version: "1.0.0".to_string(),
        is_discontinued: false,
        likes: 0,
        created: None,
    }
}

impl PackageFixture {
    pub fn name(
        mut self,
        name: &str,
    ) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn publisher(
        mut self,
        publisher_id: &str,
    ) -> Self {
        self.publisher_id = Some(publisher_id.to_string());
        self
    }

    pub fn uploader(
        mut self,
        user_id: &str,
    ) -> Self {
        self.uploaders.push(user_id.to_string());
        self
    }

    pub fn latest(
        mut self,
        version: &str,
    ) -> Self {
        self.latest_version = version.to_string();
        self
    }

    pub fn discontinued(mut self) -> Self {
        self.is_discontinued = true;
        self
    }

    pub fn likes(
        mut self,
        likes: u32,
    ) -> Self {
        self.likes = likes;
        self
    }

    pub fn created(
        mut self,
        created: DateTime<Utc>,
    ) -> Self {
        self.created = Some(created);
        self
    }

    pub fn build(self) -> Package {
        let n = next_package_n();

        Package {
            name: self
                .name
                .unwrap_or_else(|| format!("test_package{n}")),
            publisher_id: self.publisher_id,
            uploaders: self.uploaders,
            latest_version: self.latest_version,
            is_discontinued: self.is_discontinued,
            likes: self.likes,
            created: self.created.unwrap_or_else(Utc::now),
        }
    }

    pub async fn insert(
        self,
        db: &dyn Datastore,
    ) -> Result<Package> {
        store(db, self.build()).await
    }
}

pub struct VersionFixture {
    package: String,
    version: String,
    description: String,
    dependencies: BTreeMap<String, String>,
    uploader: Option<String>,
    published: Option<DateTime<Utc>>,
}

pub fn version(package: &str) -> VersionFixture {
    VersionFixture {
        package: package.to_string(),
        version: "1.0.0".to_string(),
        description: "Test package".to_string(),
        dependencies: BTreeMap::new(),
        uploader: None,
        published: None,
    }
}

impl VersionFixture {
    pub fn version(
        mut self,
        v: &str,
    ) -> Self {
        self.version = v.to_string();
        self
    }

    pub fn description(
        mut self,
        description: &str,
    ) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn dependency(
        mut self,
        name: &str,
        constraint: &str,
    ) -> Self {
        self.dependencies
            .insert(name.to_string(), constraint.to_string());
        self
    }

    pub fn uploader(
        mut self,
        user_id: &str,
    ) -> Self {
        self.uploader = Some(user_id.to_string());
        self
    }

    pub fn published(
        mut self,
        published: DateTime<Utc>,
    ) -> Self {
        self.published = Some(published);
        self
    }

    pub fn build(self) -> PackageVersion {
        PackageVersion {
            package: self.package,
            version: self.version,
            description: self.description,
            dependencies: self.dependencies,
            uploader: self.uploader,
            published: self.published.unwrap_or_else(Utc::now),
        }
    }

    pub async fn insert(
        self,
        db: &dyn Datastore,
    ) -> Result<PackageVersion> {
        store(db, self.build()).await
    }
}

pub struct ReportFixture {
    package: String,
    version: String,
    granted_points: u32,
    max_points: u32,
    tags: Vec<String>,
}

pub fn report(
    package: &str,
    version: &str,
) -> ReportFixture {
    ReportFixture {
        package: package.to_string(),
        version: version.to_string(),
        granted_points: 100,
        max_points: 140,
        tags: vec![],
    }
}

impl ReportFixture {
    pub fn points(
        mut self,
        granted: u32,
        max: u32,
    ) -> Self {
        self.granted_points = granted;
        self.max_points = max;
        self
    }

    pub fn tag(
        mut self,
        tag: &str,
    ) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn build(self) -> VersionReport {
        VersionReport {
            package: self.package,
            version: self.version,
            granted_points: self.granted_points,
            max_points: self.max_points,
            tags: self.tags,
        }
    }

    pub async fn insert(
        self,
        db: &dyn Datastore,
    ) -> Result<VersionReport> {
        store(db, self.build()).await
    }
}
