//! nexus3-rest: Nexus 3 REST API adapter
//!
//! Implements the [`nexus3_core::NexusApi`] trait on top of `reqwest`.

mod client;

pub use client::NexusClient;
