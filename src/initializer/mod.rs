//! Schema initializer
//!
//! Applies the data model to a database, entity by entity in declaration
//! order:
//!
//! 1. create the collection
//! 2. install its strict validator (`collMod`, overwrites)
//! 3. create its indexes
//!
//! "Already exists" answers from the store (collection or identical index)
//! are logged and tolerated, so a second run is a no-op. Any other store
//! error aborts the run. Steps already applied stay applied: the run is not
//! transactional.
//!
//! The whole run shares one deadline, checked before every store command.

mod errors;
mod report;

pub use errors::{InitError, InitResult, Step};
pub use report::{CollectionReport, Drift, DriftReport, IndexReport, InitReport, Outcome};

use std::time::{Duration, Instant};

use crate::model::{self, EntitySchema};
use crate::observability::Event;
use crate::store::{DocumentStore, StoreError, StoreResult};

/// Default overall deadline of a run.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Initializer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    /// Deadline for the whole run.
    ///
    /// Checked before each store command, never during one: a single slow
    /// command (e.g. an fsync-heavy write on the directory-backed store) can
    /// finish past the deadline, and the run then fails at the next check.
    pub timeout: Duration,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_INIT_TIMEOUT,
        }
    }
}

struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    fn start(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    fn check(&self, collection: &str, step: Step) -> InitResult<()> {
        if self.started.elapsed() >= self.timeout {
            tracing::error!(
                event = Event::InitFailed.as_str(),
                collection,
                step = step.as_str(),
                reason = "deadline exceeded"
            );
            return Err(InitError::Timeout {
                timeout: self.timeout,
                collection: collection.to_string(),
                step,
            });
        }
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Applies a table of entities to a document store.
#[derive(Debug, Clone)]
pub struct SchemaInitializer {
    entities: &'static [EntitySchema],
    options: InitOptions,
}

impl Default for SchemaInitializer {
    fn default() -> Self {
        Self::new(InitOptions::default())
    }
}

impl SchemaInitializer {
    /// Initializer for the CostaDelInka data model.
    pub fn new(options: InitOptions) -> Self {
        Self::with_entities(model::entities(), options)
    }

    /// Initializer for an arbitrary entity table.
    pub fn with_entities(entities: &'static [EntitySchema], options: InitOptions) -> Self {
        Self { entities, options }
    }

    pub fn entities(&self) -> &'static [EntitySchema] {
        self.entities
    }

    pub fn options(&self) -> &InitOptions {
        &self.options
    }

    /// Creates every collection, validator and index.
    ///
    /// # Errors
    ///
    /// - `Connection` if the store does not answer the initial ping
    /// - `Step` for any store error other than "already exists"
    /// - `Timeout` if the deadline passes before a command
    pub fn run<S: DocumentStore + ?Sized>(&self, store: &mut S) -> InitResult<InitReport> {
        let deadline = Deadline::start(self.options.timeout);
        let database = store.database_name().to_string();

        ping(store, &deadline, &database)?;

        tracing::info!(
            event = Event::InitStart.as_str(),
            database = %database,
            collections = self.entities.len()
        );

        let mut collections = Vec::with_capacity(self.entities.len());
        for entity in self.entities {
            collections.push(apply_entity(store, entity, &deadline)?);
        }

        let report = InitReport {
            database,
            collections,
            elapsed_ms: deadline.elapsed_ms(),
        };

        tracing::info!(
            event = Event::InitComplete.as_str(),
            database = %report.database,
            created = report.created(),
            already_present = report.already_present(),
            elapsed_ms = report.elapsed_ms
        );

        Ok(report)
    }

    /// Compares the live store against the entity table.
    ///
    /// Read-only. Drift is reported, not an error.
    pub fn verify<S: DocumentStore + ?Sized>(&self, store: &S) -> InitResult<DriftReport> {
        let deadline = Deadline::start(self.options.timeout);
        let database = store.database_name().to_string();

        ping(store, &deadline, &database)?;

        tracing::info!(
            event = Event::VerifyStart.as_str(),
            database = %database,
            collections = self.entities.len()
        );

        let mut drifts = Vec::new();
        for entity in self.entities {
            deadline.check(entity.collection, Step::Inspect)?;
            let info = store
                .collection_info(entity.collection)
                .map_err(|e| fatal(entity.collection, Step::Inspect, e))?;
            drifts.extend(entity_drift(entity, info.as_ref()));
        }

        for drift in &drifts {
            tracing::warn!(
                event = Event::DriftDetected.as_str(),
                collection = drift.collection(),
                drift = ?drift
            );
        }

        tracing::info!(
            event = Event::VerifyComplete.as_str(),
            database = %database,
            drifts = drifts.len()
        );

        Ok(DriftReport {
            database,
            checked: self.entities.len(),
            drifts,
        })
    }
}

fn ping<S: DocumentStore + ?Sized>(store: &S, deadline: &Deadline, database: &str) -> InitResult<()> {
    deadline.check(database, Step::Ping)?;
    store.ping().map_err(|source| {
        tracing::error!(
            event = Event::InitFailed.as_str(),
            database,
            step = Step::Ping.as_str(),
            code = source.code(),
            error = %source
        );
        InitError::Connection { source }
    })
}

fn apply_entity<S: DocumentStore + ?Sized>(
    store: &mut S,
    entity: &EntitySchema,
    deadline: &Deadline,
) -> InitResult<CollectionReport> {
    let name = entity.collection;

    deadline.check(name, Step::CreateCollection)?;
    let outcome = tolerate_exists(store.create_collection(name))
        .map_err(|e| fatal(name, Step::CreateCollection, e))?;
    match outcome {
        Outcome::Created => {
            tracing::info!(event = Event::CollectionCreated.as_str(), collection = name)
        }
        Outcome::AlreadyPresent => {
            tracing::warn!(event = Event::CollectionExists.as_str(), collection = name)
        }
    }

    deadline.check(name, Step::SetValidator)?;
    store
        .set_validator(name, model::validator(entity))
        .map_err(|e| fatal(name, Step::SetValidator, e))?;
    tracing::info!(event = Event::ValidatorApplied.as_str(), collection = name);

    let mut indexes = Vec::with_capacity(entity.indexes.len());
    for spec in entity.indexes {
        deadline.check(name, Step::CreateIndex)?;
        let index_name = spec.name();
        let outcome = tolerate_exists(store.create_index(name, spec.to_model()).map(|_| ()))
            .map_err(|e| fatal(name, Step::CreateIndex, e))?;
        match outcome {
            Outcome::Created => tracing::info!(
                event = Event::IndexCreated.as_str(),
                collection = name,
                index = %index_name,
                unique = spec.unique,
                sparse = spec.sparse
            ),
            Outcome::AlreadyPresent => tracing::warn!(
                event = Event::IndexExists.as_str(),
                collection = name,
                index = %index_name
            ),
        }
        indexes.push(IndexReport {
            name: index_name,
            outcome,
        });
    }

    Ok(CollectionReport {
        collection: name.to_string(),
        outcome,
        validator_applied: true,
        indexes,
    })
}

/// Maps an "already exists" answer to `AlreadyPresent`.
fn tolerate_exists(result: StoreResult<()>) -> StoreResult<Outcome> {
    match result {
        Ok(()) => Ok(Outcome::Created),
        Err(e) if e.is_already_exists() => Ok(Outcome::AlreadyPresent),
        Err(e) => Err(e),
    }
}

fn fatal(collection: &str, step: Step, source: StoreError) -> InitError {
    tracing::error!(
        event = Event::InitFailed.as_str(),
        collection,
        step = step.as_str(),
        code = source.code(),
        error = %source
    );
    InitError::Step {
        collection: collection.to_string(),
        step,
        source,
    }
}

fn entity_drift(entity: &EntitySchema, info: Option<&crate::store::CollectionInfo>) -> Vec<Drift> {
    let collection = entity.collection.to_string();
    let Some(info) = info else {
        return vec![Drift::MissingCollection { collection }];
    };

    let mut drifts = Vec::new();

    match &info.validator {
        None => drifts.push(Drift::MissingValidator {
            collection: collection.clone(),
        }),
        Some(v) if *v != model::validator(entity) => drifts.push(Drift::ValidatorMismatch {
            collection: collection.clone(),
        }),
        Some(_) => {}
    }

    for expected in entity.index_models() {
        let name = expected.name();
        let live = info
            .index(&name)
            .or_else(|| info.indexes.iter().find(|i| i.model.same_keys(&expected)));

        match live {
            None => drifts.push(Drift::MissingIndex {
                collection: collection.clone(),
                index: name,
            }),
            Some(live) if !live.model.equivalent(&expected) => drifts.push(Drift::IndexMismatch {
                collection: collection.clone(),
                index: name,
                actual: live.model.clone(),
                expected,
            }),
            Some(_) => {}
        }
    }

    drifts
}
