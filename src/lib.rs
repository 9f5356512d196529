//! PayMaster Gateway - checkout integration for paymaster.ru
//!
//! Builds signed redirect forms for the hosted payment page, verifies and
//! applies payment notifications, and wraps the partner REST API.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
