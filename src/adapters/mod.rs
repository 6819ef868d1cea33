//! Inbound adapters.
//!
//! Each adapter turns a platform payload into an [`slack::InboundQuery`]:
//! the query text plus who asked and where the reply should go. Nothing
//! here interprets the question itself.

pub mod slack;
