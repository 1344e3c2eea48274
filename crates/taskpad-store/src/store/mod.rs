//! High-level store API: transactional writes, live snapshot queries, and
//! the async repository façade.

pub mod repository;
pub mod subscription;
pub mod task_store;
