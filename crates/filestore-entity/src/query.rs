//! Filter and sort value objects for file and event listings.
//!
//! A filter is applied identically to the page query and to its count, so
//! the two can never disagree.

use uuid::Uuid;

use filestore_core::types::{PageRequest, Sort, SortDirection, SortKey};

use crate::event::EventKind;
use crate::file::FileStatus;

/// Sortable file fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSortKey {
    Id,
    Name,
    Status,
    CreatedAt,
}

impl SortKey for FileSortKey {
    const ACCEPTED: &'static str = "id, name, status, createdAt";

    fn from_field(field: &str) -> Option<Self> {
        match field {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

impl FileSortKey {
    /// Newest first.
    pub const DEFAULT_SORT: Sort<FileSortKey> = Sort {
        key: FileSortKey::CreatedAt,
        direction: SortDirection::Desc,
    };
}

/// Sortable event fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSortKey {
    Id,
    Status,
    CreatedAt,
    UserId,
}

impl SortKey for EventSortKey {
    const ACCEPTED: &'static str = "id, status, createdAt, userId";

    fn from_field(field: &str) -> Option<Self> {
        match field {
            "id" => Some(Self::Id),
            "status" => Some(Self::Status),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "userId" | "user_id" => Some(Self::UserId),
            _ => None,
        }
    }
}

impl EventSortKey {
    /// Newest first.
    pub const DEFAULT_SORT: Sort<EventSortKey> = Sort {
        key: EventSortKey::CreatedAt,
        direction: SortDirection::Desc,
    };
}

/// Row predicate for file listings. `None` fields do not constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Restrict to files of this owner.
    pub owner_id: Option<Uuid>,
    /// Restrict to files in this state.
    pub status: Option<FileStatus>,
}

/// Row predicate for event listings. All present fields are ANDed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Visibility scope: only events whose actor is this user.
    pub actor_id: Option<Uuid>,
    /// Client-requested actor filter.
    pub user_id: Option<Uuid>,
    /// Client-requested kind filter.
    pub kind: Option<EventKind>,
}

/// One page of files.
#[derive(Debug, Clone, Copy)]
pub struct FileQuery {
    pub filter: FileFilter,
    pub sort: Sort<FileSortKey>,
    pub page: PageRequest,
}

/// One page of events.
#[derive(Debug, Clone, Copy)]
pub struct EventQuery {
    pub filter: EventFilter,
    pub sort: Sort<EventSortKey>,
    pub page: PageRequest,
}
