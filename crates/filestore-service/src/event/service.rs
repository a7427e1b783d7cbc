//! Event ledger queries.

use std::sync::Arc;

use uuid::Uuid;

use filestore_auth::{Operation, ResolvedIdentity, Scope, enforce};
use filestore_core::offload::PersistencePool;
use filestore_core::result::AppResult;
use filestore_core::types::{PageRequest, PageResponse, Sort};
use filestore_database::store::EventStore;
use filestore_entity::event::{Event, EventKind};
use filestore_entity::query::{EventFilter, EventQuery, EventSortKey};

/// Serves the audit trail, scoped to what the actor may see.
///
/// Plain users only ever receive their own events. The restriction is part
/// of the store predicate, so counts and pages never include rows the
/// caller cannot see.
#[derive(Debug, Clone)]
pub struct EventLedger {
    events: Arc<dyn EventStore>,
    pool: PersistencePool,
}

impl EventLedger {
    /// Creates a new event ledger.
    pub fn new(events: Arc<dyn EventStore>, pool: PersistencePool) -> Self {
        Self { events, pool }
    }

    /// Every visible event, newest first with ties broken by id.
    pub async fn list_for_actor(&self, actor: &ResolvedIdentity) -> AppResult<Vec<Event>> {
        let filter = EventFilter {
            actor_id: Self::scope(actor)?,
            ..EventFilter::default()
        };
        let events = self.events.clone();
        self.pool.run(async move { events.list(filter).await }).await
    }

    /// One page of visible events, optionally filtered by actor and kind.
    pub async fn list_paged(
        &self,
        actor: &ResolvedIdentity,
        user_id: Option<Uuid>,
        status: Option<&str>,
        page: PageRequest,
        sort: Option<&str>,
    ) -> AppResult<PageResponse<Event>> {
        let kind = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<EventKind>()?),
            None => None,
        };
        let query = EventQuery {
            filter: EventFilter {
                actor_id: Self::scope(actor)?,
                user_id,
                kind,
            },
            sort: Sort::parse_or(sort, EventSortKey::DEFAULT_SORT)?,
            page,
        };

        let events = self.events.clone();
        self.pool.run(async move { events.page(&query).await }).await
    }

    fn scope(actor: &ResolvedIdentity) -> AppResult<Option<Uuid>> {
        Ok(match enforce(Some(actor), None, Operation::ListMany)? {
            Scope::All => None,
            Scope::OwnedBy(id) => Some(id),
        })
    }
}
