//! In-process test harness for the depot registry.
//!
//! Tests run against a fully wired registry (datastore, search index,
//! frontend and search-service handlers) without opening a socket:
//!
//! ```no_run
//! use depot_harness::{ServicesOptions, registry_client, with_services};
//!
//! # async fn demo() -> Result<(), depot_harness::HarnessError> {
//! with_services(ServicesOptions::default(), |scope| async move {
//!     let client = registry_client(&scope)?;
//!     let neon = client.package("neon").await?;
//!     assert_eq!(neon.name, "neon");
//!     Ok(())
//! })
//! .await
//! # }
//! ```

pub mod bridge;
pub mod import;
pub mod logging;
pub mod populate;
pub mod profile;
pub mod response;
mod services;

pub use bridge::{BridgedRequest, Handler, MockTransport, bridged_client};
pub use depot_scope::{BoxError, Scope};
pub use import::{AutoGeneratedSource, ImportSource, VersionMeta, auto_generated, import_profile};
pub use populate::{Baseline, populate};
pub use profile::{TestProfile, user_id};
pub use response::TestResponse;
pub use services::{
    ProfileOptions, ServicesOptions, check_integrity, registry_client, registry_client_with_token,
    verify_integrity, with_profile, with_services,
};

use depot_registry_db::Problem;
use depot_scope::{ScopeError, TeardownError};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid profile: {0}")]
    Profile(String),

    #[error("invalid version `{version}`: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("database error: {0}")]
    Database(#[from] depot_registry_db::Error),

    #[error("search error: {0}")]
    Search(#[from] depot_registry_search::Error),

    #[error("client error: {0}")]
    Client(#[from] depot_registry_client::Error),

    #[error("scope error: {0}")]
    Scope(#[from] depot_scope::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a harnessed test that did not pass.
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    /// Services could not be wired or seeded; the body never ran.
    #[error("test setup failed: {0}")]
    Setup(#[source] Error),

    #[error("{0}")]
    Body(BoxError),

    #[error("test body did not finish within {0:?}")]
    Timeout(Duration),

    #[error("integrity check found {count} problem(s), first: {first}")]
    Integrity {
        count: usize,
        first: String,
        problems: Vec<Problem>,
    },

    #[error("integrity check could not run: {0}")]
    IntegrityCheck(#[source] Error),

    #[error(transparent)]
    Teardown(TeardownError),

    /// A failure with further failures that happened while cleaning up
    /// after it. `primary` is what the test is reported as.
    #[error("{primary} (also: {})", join(.secondary))]
    Compound {
        primary: Box<HarnessError>,
        secondary: Vec<HarnessError>,
    },
}

fn join(errors: &[HarnessError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl HarnessError {
    /// Attaches `secondary` failures, keeping `self` as the reported one.
    pub fn with_secondary(
        self,
        secondary: impl IntoIterator<Item = HarnessError>,
    ) -> Self {
        let secondary: Vec<HarnessError> = secondary.into_iter().collect();
        if secondary.is_empty() {
            return self;
        }

        match self {
            HarnessError::Compound {
                primary,
                secondary: mut existing,
            } => {
                existing.extend(secondary);
                HarnessError::Compound {
                    primary,
                    secondary: existing,
                }
            },
            primary => {
                HarnessError::Compound {
                    primary: Box::new(primary),
                    secondary,
                }
            },
        }
    }

    /// The failure a test is reported as.
    pub fn primary(&self) -> &HarnessError {
        match self {
            HarnessError::Compound { primary, .. } => primary.primary(),
            other => other,
        }
    }

    pub fn secondary(&self) -> &[HarnessError] {
        match self {
            HarnessError::Compound { secondary, .. } => secondary,
            _ => &[],
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self.primary(), HarnessError::Setup(_))
    }

    pub fn is_body(&self) -> bool {
        matches!(self.primary(), HarnessError::Body(_))
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self.primary(), HarnessError::Integrity { .. })
    }
}

/// Body errors that are themselves harness failures (e.g. a nested
/// `with_profile` setup step) keep their classification.
impl From<BoxError> for HarnessError {
    fn from(err: BoxError) -> Self {
        match err.downcast::<HarnessError>() {
            Ok(harness) => *harness,
            Err(err) => HarnessError::Body(err),
        }
    }
}

impl<E> From<ScopeError<E>> for HarnessError
where
    E: Into<HarnessError>, {
    fn from(err: ScopeError<E>) -> Self {
        match err {
            ScopeError::Body { error, teardown } => {
                error
                    .into()
                    .with_secondary(teardown.map(HarnessError::Teardown))
            },
            ScopeError::Teardown(err) => HarnessError::Teardown(err),
            ScopeError::Closed(err) => HarnessError::Setup(err.into()),
        }
    }
}
