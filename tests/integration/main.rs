//! HTTP-level integration tests driving the full router over in-memory
//! stores.

mod helpers;

mod admin_test;
mod auth_test;
mod event_test;
mod file_test;
mod pagination_test;
mod permission_test;
mod storage_test;
