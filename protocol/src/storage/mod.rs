//! # Storage Module
//!
//! The protocol core owns no storage. Everything it reads or writes while
//! applying a transition goes through the [`StateRepository`] trait, which
//! the embedding node implements over whatever backend it runs.
//!
//! ## Architecture
//!
//! ```text
//! repository.rs  — StateRepository trait, DocumentQuery, RepositoryError
//! memory.rs      — InMemoryStateRepository (parking_lot locks over maps)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Synchronous `&self`.** Apply logic is a short sequence of reads and
//!    writes with no I/O of its own. Implementations that talk to a remote
//!    store can block inside the call.
//!
//! 2. **No transactions.** Check-then-act on asset lock out points is the
//!    caller's responsibility; the protocol calls the check and the mark in
//!    order and nothing else.

pub mod memory;
pub mod repository;

pub use memory::InMemoryStateRepository;
pub use repository::{DocumentQuery, RepositoryError, RepositoryResult, StateRepository};
