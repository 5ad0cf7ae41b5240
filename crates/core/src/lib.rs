#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Aerolines flight-booking simulator.
//!
//! This crate hosts the flight and user models, the in-memory flight
//! board, booking/cancellation rules, user persistence, and configuration
//! used by the terminal UI and any future frontends.

pub mod booking;
pub mod config;
pub mod directory;
pub mod models;
pub mod registry;
pub mod save;
pub mod session;

pub use booking::{BookingError, BookingService, CancelError};
pub use config::AppConfig;
pub use directory::{LoginError, LoginOutcome, UserDirectory};
pub use models::{Direction, FareClass, Flight, FlightStatus, SeatInventory, User};
pub use registry::{FlightRegistry, FlightTemplate};
pub use save::UserStore;
pub use session::{BookingSession, SessionError};
