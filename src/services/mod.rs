//! Domain services used by the websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room membership, delivery, persistence and upload
//! accounting so route handlers stay focused on protocol translation.

pub mod broadcast;
pub mod desk;
pub mod progress;
pub mod room;
pub mod storage;
pub mod upload;
