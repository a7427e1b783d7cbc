//! In-memory implementation of every store trait.
//!
//! All state sits behind one lock, so each paired file mutation and event
//! append is atomic exactly like its transactional Postgres counterpart.
//! Backs the unit and integration tests; the server itself always runs on
//! Postgres.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use filestore_core::error::AppError;
use filestore_core::result::AppResult;
use filestore_core::types::{PageResponse, Sort, SortDirection};
use filestore_entity::event::{Event, NewEvent};
use filestore_entity::file::{CreateStorageFile, FileStatus, StorageFile};
use filestore_entity::query::{
    EventFilter, EventQuery, EventSortKey, FileFilter, FileQuery, FileSortKey,
};
use filestore_entity::user::{CreateUser, Role, User, UserStatus};

use crate::store::{EventStore, FileStore, UserDeletion, UserStore};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    files: HashMap<Uuid, StorageFile>,
    events: Vec<Event>,
}

impl MemoryState {
    fn append_event(&mut self, file_id: Uuid, event: NewEvent) -> Event {
        let recorded = Event {
            id: Uuid::now_v7(),
            user_id: event.user_id,
            file_id,
            kind: event.kind,
            message: event.message,
            created_at: Utc::now(),
        };
        self.events.push(recorded.clone());
        recorded
    }

    fn active_file_mut(&mut self, id: Uuid) -> AppResult<&mut StorageFile> {
        match self.files.get_mut(&id) {
            None => Err(AppError::not_found("File not found")),
            Some(file) if file.status != FileStatus::Active => {
                Err(AppError::conflict("File is archived"))
            }
            Some(file) => Ok(file),
        }
    }
}

/// Thread-safe in-memory database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn compare_files(a: &StorageFile, b: &StorageFile, sort: Sort<FileSortKey>) -> Ordering {
    let primary = match sort.key {
        FileSortKey::Id => a.id.cmp(&b.id),
        FileSortKey::Name => a.name.cmp(&b.name),
        FileSortKey::Status => (a.status as u8).cmp(&(b.status as u8)),
        FileSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    directed(primary, sort.direction).then_with(|| b.id.cmp(&a.id))
}

fn compare_events(a: &Event, b: &Event, sort: Sort<EventSortKey>) -> Ordering {
    let primary = match sort.key {
        EventSortKey::Id => a.id.cmp(&b.id),
        EventSortKey::Status => (a.kind as u8).cmp(&(b.kind as u8)),
        EventSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        EventSortKey::UserId => a.user_id.cmp(&b.user_id),
    };
    directed(primary, sort.direction).then_with(|| b.id.cmp(&a.id))
}

fn file_matches(file: &StorageFile, filter: &FileFilter) -> bool {
    filter.owner_id.is_none_or(|owner| file.owner_id == owner)
        && filter.status.is_none_or(|status| file.status == status)
}

fn event_matches(event: &Event, filter: &EventFilter) -> bool {
    filter.actor_id.is_none_or(|actor| event.user_id == actor)
        && filter.user_id.is_none_or(|user| event.user_id == user)
        && filter.kind.is_none_or(|kind| event.kind == kind)
}

fn paginate<T>(mut rows: Vec<T>, page: filestore_core::types::PageRequest) -> PageResponse<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX).min(rows.len());
    let content: Vec<T> = rows
        .drain(offset..)
        .take(page.limit() as usize)
        .collect();
    PageResponse::new(content, page, total)
}

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == data.username) {
            return Err(AppError::conflict("Username already exists"));
        }

        let mut roles = data.roles.clone();
        roles.sort();
        roles.dedup();
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: data.username.clone(),
            password_hash: data.password_hash.clone(),
            status: data.status,
            roles,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_roles(&self, id: Uuid, roles: &[Role]) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(&id).map(|user| {
            let mut roles = roles.to_vec();
            roles.sort();
            roles.dedup();
            user.roles = roles;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.status = status;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_if_unreferenced(&self, id: Uuid) -> AppResult<UserDeletion> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Ok(UserDeletion::NotFound);
        }
        let referenced = state.files.values().any(|f| f.owner_id == id)
            || state.events.iter().any(|e| e.user_id == id);
        if referenced {
            return Ok(UserDeletion::Referenced);
        }
        state.users.remove(&id);
        Ok(UserDeletion::Deleted)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl FileStore for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StorageFile>> {
        Ok(self.state.lock().await.files.get(&id).cloned())
    }

    async fn list(&self, filter: FileFilter) -> AppResult<Vec<StorageFile>> {
        let state = self.state.lock().await;
        let mut files: Vec<StorageFile> = state
            .files
            .values()
            .filter(|f| file_matches(f, &filter))
            .cloned()
            .collect();
        files.sort_by(|a, b| compare_files(a, b, FileSortKey::DEFAULT_SORT));
        Ok(files)
    }

    async fn page(&self, query: &FileQuery) -> AppResult<PageResponse<StorageFile>> {
        let state = self.state.lock().await;
        let mut files: Vec<StorageFile> = state
            .files
            .values()
            .filter(|f| file_matches(f, &query.filter))
            .cloned()
            .collect();
        files.sort_by(|a, b| compare_files(a, b, query.sort));
        Ok(paginate(files, query.page))
    }

    async fn create_with_event(
        &self,
        data: &CreateStorageFile,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&data.owner_id) {
            return Err(AppError::unauthorized("Owner no longer exists"));
        }

        let now = Utc::now();
        let file = StorageFile {
            id: data.id,
            name: data.name.clone(),
            location: data.location.clone(),
            storage_key: data.storage_key.clone(),
            content_type: data.content_type.clone(),
            size_bytes: data.size_bytes,
            status: FileStatus::Active,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.files.insert(file.id, file.clone());
        let recorded = state.append_event(file.id, event);
        Ok((file, recorded))
    }

    async fn rename_with_event(
        &self,
        id: Uuid,
        name: &str,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        let mut state = self.state.lock().await;
        let file = state.active_file_mut(id)?;
        file.name = name.to_string();
        file.updated_at = Utc::now();
        let file = file.clone();
        let recorded = state.append_event(id, event);
        Ok((file, recorded))
    }

    async fn archive_with_event(
        &self,
        id: Uuid,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        let mut state = self.state.lock().await;
        let file = state.active_file_mut(id)?;
        file.status = FileStatus::Archived;
        file.updated_at = Utc::now();
        let file = file.clone();
        let recorded = state.append_event(id, event);
        Ok((file, recorded))
    }
}

#[async_trait]
impl EventStore for MemoryDatabase {
    async fn list(&self, filter: EventFilter) -> AppResult<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| event_matches(e, &filter))
            .cloned()
            .collect();
        events.sort_by(|a, b| compare_events(a, b, EventSortKey::DEFAULT_SORT));
        Ok(events)
    }

    async fn page(&self, query: &EventQuery) -> AppResult<PageResponse<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| event_matches(e, &query.filter))
            .cloned()
            .collect();
        events.sort_by(|a, b| compare_events(a, b, query.sort));
        Ok(paginate(events, query.page))
    }
}
