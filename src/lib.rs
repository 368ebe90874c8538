//! Commitwork - commit creation over a pluggable object store
//!
//! Commitwork turns the staging area of a repository into a new commit:
//! it validates the caller's identity and parents, refuses empty commits,
//! writes the tree, assembles the commit and advances a reference, then
//! returns a serializable record of what was created.
//!
//! # Architecture
//!
//! - [`commit`] - The commit orchestrator and its stages
//! - [`core`] - Domain types, signatures, status and configuration
//! - [`store`] - The object store contract, a libgit2 store and a mock
//!
//! # Correctness Invariants
//!
//! 1. Exactly one store call mutates the repository, and it runs last
//! 2. Every store handle acquired by an attempt is released when it ends
//! 3. A failed attempt never leaves a new commit referenced

pub mod commit;
pub mod core;
pub mod store;
