//! # prelaunch-core
//!
//! Startup preparation steps run inside a container before its workload
//! begins serving.
//!
//! This crate provides:
//! - **Privilege**: resolving a `user[:group]` spec and switching the process
//!   to it in the order supplementary groups, gid, uid.
//! - **User**: passwd and group database discovery and parsing.
//! - **Wait**: discovering linked TCP dependencies from the environment and
//!   blocking until each accepts a connection.
//! - **Env**: an injectable view of the process environment.
//!
//! Both steps run once, synchronously, on the bootstrap thread.

pub mod env;
pub mod privilege;
pub mod user;
pub mod wait;
