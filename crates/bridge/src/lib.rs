//! HTTP-to-event bridge for bot-list vote webhooks.
//!
//! [`EventBridge`] serves a small axum router in a background task. An
//! authorized `POST /vote` becomes a `vote` or `test_vote` custom event on the
//! shared dispatcher; the server never touches bot state any other way.

pub mod bridge;
pub mod error;
pub mod module;
pub mod server;
pub mod vote;

pub use {
    bridge::{BridgePhase, EventBridge},
    error::{Error, Result},
    module::{BRIDGE_MODULE, BridgeModule},
    server::{BridgeState, PingResponse, build_bridge_app},
    vote::{TEST_VOTE_EVENT, VOTE_EVENT, VoteKind, extract_payload},
};
