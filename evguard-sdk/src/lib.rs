//! Request and response types for the eventsguard HTTP API.

#![forbid(unsafe_code)]

pub mod objects;
