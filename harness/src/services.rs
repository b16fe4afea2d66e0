use crate::{
    Error, HarnessError, Result,
    bridge::{MockTransport, bridged_client},
    import::{ImportSource, auto_generated, import_profile},
    logging,
    populate::{Baseline, populate},
    profile::TestProfile,
};
use depot_registry::{CONFIG, RegistryConfig, config::registry_config};
use depot_registry_client::{RegistryClient, SEARCH_CLIENT, SearchClient, TokenProvider};
use depot_registry_db::{
    DATASTORE, Datastore, IntegrityChecker, MemDatastore, NAME_TRACKER, NameTracker, Problem,
};
use depot_registry_search::{MemSearchIndex, SEARCH_INDEX, SearchIndex};
use depot_scope::{BoxError, Scope};
use std::{convert::Infallible, future::Future, sync::Arc, time::Duration};
use tracing::Instrument;

/// Options for [`with_services`].
#[derive(bon::Builder, Default)]
pub struct ServicesOptions {
    /// Skip seeding; the index is still brought to ready, empty.
    #[builder(default)]
    pub omit_data: bool,

    /// Bound on the test body, not on setup.
    pub timeout: Option<Duration>,

    /// Seeded instead of [`Baseline::default_baseline`].
    pub baseline: Option<Baseline>,

    /// Backing store; a fresh [`MemDatastore`] when unset.
    pub datastore: Option<Arc<dyn Datastore>>,
}

/// Options for [`with_profile`].
#[derive(bon::Builder, Default, Clone)]
pub struct ProfileOptions {
    /// Imported instead of [`TestProfile::default_profile`].
    pub test_profile: Option<TestProfile>,

    /// Content source for the import; generated when unset.
    pub import_source: Option<Arc<dyn ImportSource>>,

    pub timeout: Option<Duration>,
}

/// Binds the process services into `scope` and seeds them.
async fn setup(
    scope: &Scope,
    options: &ServicesOptions,
) -> Result<()> {
    let config = Arc::new(RegistryConfig::fake());
    scope.set(&CONFIG, config.clone());

    let db: Arc<dyn Datastore> = match &options.datastore {
        Some(db) => db.clone(),
        None => Arc::new(MemDatastore::new()),
    };
    scope.set(&DATASTORE, db.clone());

    let index: Arc<dyn SearchIndex> = Arc::new(MemSearchIndex::new());
    scope.set(&SEARCH_INDEX, index.clone());
    scope.set(&NAME_TRACKER, Arc::new(NameTracker::new()));

    if !options.omit_data {
        match &options.baseline {
            Some(baseline) => populate(scope, baseline).await?,
            None => populate(scope, &Baseline::default_baseline()?).await?,
        }
    }

    index.update_all_packages(db.as_ref()).await?;
    index.mark_ready();
    index.wait_ready().await;

    depot_registry_db::name_tracker(scope)?
        .rebuild(db.as_ref())
        .await?;

    let search = SearchClient::new(bridged_client(
        scope,
        &config.search_service_url,
        Arc::new(depot_registry_search::configure),
    )?);
    scope.set(&SEARCH_CLIENT, search.clone());
    scope.register_teardown(move || {
        async move {
            search.close();
            Ok::<_, Infallible>(())
        }
    })?;

    Ok(())
}

async fn run_body<F, Fut>(
    scope: Scope,
    timeout: Option<Duration>,
    body: F,
) -> std::result::Result<(), HarnessError>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = std::result::Result<(), BoxError>>, {
    let body = body(scope);

    let outcome = match timeout {
        Some(limit) => {
            tokio::time::timeout(limit, body)
                .await
                .map_err(|_| HarnessError::Timeout(limit))?
        },
        None => body.await,
    };

    outcome.map_err(HarnessError::from)
}

async fn run_services<F, Fut>(
    scope: Scope,
    options: ServicesOptions,
    body: F,
) -> std::result::Result<(), HarnessError>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = std::result::Result<(), BoxError>>, {
    setup(&scope, &options)
        .await
        .map_err(HarnessError::Setup)?;

    let timeout = options.timeout;
    scope
        .enter(|child| {
            async move {
                let outcome = run_body(child.clone(), timeout, body).await;
                // checked in the body's scope, before its teardowns run
                let integrity = verify_integrity(&child).await;

                match outcome {
                    Ok(()) => integrity,
                    Err(err) => Err(err.with_secondary(integrity.err())),
                }
            }
        })
        .await
        .map_err(HarnessError::from)
}

/// Runs `body` against a fully wired, seeded registry.
///
/// The body runs in a child of the test scope, so anything it binds or
/// registers for teardown is released before the services are. After the
/// body, the datastore is checked for integrity problems; those fail the
/// test even when the body passed. A body failure is always reported as
/// the primary error.
pub async fn with_services<F, Fut>(
    options: ServicesOptions,
    body: F,
) -> std::result::Result<(), HarnessError>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = std::result::Result<(), BoxError>>, {
    logging::init();

    Scope::root()
        .enter(|scope| run_services(scope, options, body))
        .await
        .map_err(HarnessError::from)
}

async fn import(
    scope: &Scope,
    profile: Option<TestProfile>,
    source: Option<Arc<dyn ImportSource>>,
) -> Result<()> {
    let profile = profile.unwrap_or_else(TestProfile::default_profile);
    let source = source.unwrap_or_else(auto_generated);

    import_profile(scope, &profile, source.as_ref()).await?;

    let db = depot_registry_db::datastore(scope)?;
    depot_registry_db::name_tracker(scope)?
        .rebuild(db.as_ref())
        .await?;

    Ok(())
}

/// Runs `body` against services seeded from a test profile instead of the
/// default baseline.
pub async fn with_profile<F, Fut>(
    name: &str,
    options: ProfileOptions,
    body: F,
) -> std::result::Result<(), HarnessError>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = std::result::Result<(), BoxError>>, {
    let ProfileOptions {
        test_profile,
        import_source,
        timeout,
    } = options;

    let services = ServicesOptions::builder()
        .omit_data(true)
        .maybe_timeout(timeout)
        .build();

    with_services(services, move |scope| {
        async move {
            import(&scope, test_profile, import_source)
                .await
                .map_err(|err| Box::new(HarnessError::Setup(err)) as BoxError)?;

            scope
                .enter(body)
                .await
                .map_err(|err| Box::new(HarnessError::from(err)) as BoxError)
        }
    })
    .instrument(tracing::info_span!("with_profile", test = name))
    .await
}

/// Runs the integrity checker over the datastore bound in `scope`.
pub async fn check_integrity(scope: &Scope) -> Result<Vec<Problem>> {
    let db = depot_registry_db::datastore(scope)?;

    Ok(IntegrityChecker::new(db.as_ref())
        .check()
        .await?)
}

/// Fails with [`HarnessError::Integrity`] when the datastore bound in
/// `scope` has any problem.
pub async fn verify_integrity(scope: &Scope) -> std::result::Result<(), HarnessError> {
    let problems = check_integrity(scope)
        .await
        .map_err(HarnessError::IntegrityCheck)?;

    let Some(first) = problems.first().map(ToString::to_string) else {
        return Ok(());
    };

    tracing::error!(count = problems.len(), %first, "integrity check failed");
    Err(HarnessError::Integrity {
        count: problems.len(),
        first,
        problems,
    })
}

fn frontend(scope: &Scope) -> MockTransport {
    MockTransport::new(scope.clone(), Arc::new(depot_registry::configure)).with_sanitizer()
}

/// A client for the registry frontend, served in children of `scope`.
pub fn registry_client(scope: &Scope) -> Result<RegistryClient> {
    let config = registry_config(scope);

    Ok(frontend(scope).into_client(&config.primary_site_url)?)
}

/// Like [`registry_client`], authenticating every request with the
/// provider's current token.
pub fn registry_client_with_token(
    scope: &Scope,
    token: Arc<dyn TokenProvider>,
) -> Result<RegistryClient> {
    let config = registry_config(scope);

    frontend(scope)
        .with_token_provider(token)
        .into_client(&config.primary_site_url)
        .map_err(Error::from)
}
