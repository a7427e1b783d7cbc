//! Store contracts required by the service layer.

use async_trait::async_trait;
use uuid::Uuid;

use filestore_core::result::AppResult;
use filestore_core::types::PageResponse;
use filestore_entity::event::{Event, NewEvent};
use filestore_entity::file::{CreateStorageFile, StorageFile};
use filestore_entity::query::{EventFilter, EventQuery, FileFilter, FileQuery};
use filestore_entity::user::{CreateUser, Role, User, UserStatus};

/// Outcome of a guarded user deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeletion {
    /// The user was removed.
    Deleted,
    /// No such user.
    NotFound,
    /// The user still owns files or is the actor of events.
    Referenced,
}

/// Credential store: users, their status and role sets.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by login name.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// All users ordered by username.
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Insert a user with its roles. Fails with `Conflict` on a taken username.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Replace the role set. `None` when the user does not exist.
    async fn set_roles(&self, id: Uuid, roles: &[Role]) -> AppResult<Option<User>>;

    /// Change the account status. `None` when the user does not exist.
    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<Option<User>>;

    /// Delete the user unless any file or event references it. The check
    /// and the delete happen atomically.
    async fn delete_if_unreferenced(&self, id: Uuid) -> AppResult<UserDeletion>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// File registry persistence. Mutations append their event atomically.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a file by id, in any status.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StorageFile>>;

    /// All files matching `filter`, newest first.
    async fn list(&self, filter: FileFilter) -> AppResult<Vec<StorageFile>>;

    /// One page of files; the total uses the same predicate.
    async fn page(&self, query: &FileQuery) -> AppResult<PageResponse<StorageFile>>;

    /// Insert an `ACTIVE` file row and its `CREATED` event.
    async fn create_with_event(
        &self,
        data: &CreateStorageFile,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)>;

    /// Rename an `ACTIVE` file and append its `UPDATED` event.
    ///
    /// Fails with `NotFound` when absent and `Conflict` when archived.
    async fn rename_with_event(
        &self,
        id: Uuid,
        name: &str,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)>;

    /// Mark an `ACTIVE` file `ARCHIVED` and append its `DELETED` event.
    ///
    /// Fails with `NotFound` when absent and `Conflict` when already archived.
    async fn archive_with_event(&self, id: Uuid, event: NewEvent)
    -> AppResult<(StorageFile, Event)>;
}

/// Read side of the event ledger.
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug + 'static {
    /// All events matching `filter`, ordered by creation time then id, newest first.
    async fn list(&self, filter: EventFilter) -> AppResult<Vec<Event>>;

    /// One page of events; the total uses the same predicate.
    async fn page(&self, query: &EventQuery) -> AppResult<PageResponse<Event>>;
}
