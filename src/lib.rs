//! minwon-kiosk - core of the family-registration form guide kiosk.
//!
//! Drives the card screen and guide modal of a touchscreen kiosk: resettable
//! idle and auto-close timers, and the view state machine they feed.

pub mod clock;
pub mod config;
pub mod domain;
pub mod input;
pub mod kiosk;
pub mod present;
pub mod timer;
pub mod view;
