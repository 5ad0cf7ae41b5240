//! Seat booking and cancellation.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    models::{FareClass, Flight, FlightStatus, User},
    registry::{FlightRegistry, FlightTemplate, BASELINE_FLIGHTS},
};

/// Reasons a booking attempt is rejected. A rejected attempt never changes state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// No flight with that number is on the board.
    #[error("flight {0} not found")]
    NotFound(String),

    /// The flight is neither scheduled nor boarding.
    #[error("flight {flight_number} is {status} and cannot be booked")]
    NotBookable {
        /// Flight that was requested.
        flight_number: String,
        /// Its current status.
        status: FlightStatus,
    },

    /// The requested fare class is not Economy, Business or FirstClass.
    #[error("unknown fare class '{0}'")]
    InvalidClass(String),

    /// No seats remain in the requested class.
    #[error("no {class} seats left on flight {flight_number}")]
    SoldOut {
        /// Flight that was requested.
        flight_number: String,
        /// Class that is exhausted.
        class: FareClass,
    },
}

/// Reasons a cancellation is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CancelError {
    /// The user holds no bookings.
    #[error("no bookings to cancel")]
    EmptyBookingList,

    /// The index does not address a booking.
    #[error("booking {index} out of range (have {len})")]
    InvalidIndex {
        /// Zero-based index that was requested.
        index: usize,
        /// Number of bookings held.
        len: usize,
    },
}

/// Applies bookings and cancellations against the registry and a user.
///
/// Cancelling does not put seats back unless `restore_seats_on_cancel` is
/// enabled. When it is, only seats this service deducted during the current
/// process are restored, since the persisted booking list does not record
/// fare classes.
#[derive(Debug, Default)]
pub struct BookingService {
    restore_seats_on_cancel: bool,
    ledger: HashMap<(String, String), Vec<FareClass>>,
}

impl BookingService {
    /// Create a service with the given cancellation policy.
    pub fn new(restore_seats_on_cancel: bool) -> Self {
        Self {
            restore_seats_on_cancel,
            ledger: HashMap::new(),
        }
    }

    /// Whether cancellations give seats back.
    pub fn restores_seats_on_cancel(&self) -> bool {
        self.restore_seats_on_cancel
    }

    /// Book one seat of `fare_class` on `flight_number` for `user`.
    ///
    /// The user's list gains the flight at most once, but every successful
    /// call takes a seat, so booking the same flight twice uses two seats.
    pub fn book(
        &mut self,
        registry: &mut FlightRegistry,
        user: &mut User,
        flight_number: &str,
        fare_class: &str,
    ) -> Result<Flight, BookingError> {
        let flight = registry
            .find_by_number_mut(flight_number)
            .ok_or_else(|| BookingError::NotFound(flight_number.trim().to_string()))?;

        if !flight.is_bookable() {
            return Err(BookingError::NotBookable {
                flight_number: flight.flight_number.clone(),
                status: flight.status,
            });
        }

        let class = FareClass::parse(fare_class)
            .ok_or_else(|| BookingError::InvalidClass(fare_class.trim().to_string()))?;

        if !flight.seats.take_one(class) {
            return Err(BookingError::SoldOut {
                flight_number: flight.flight_number.clone(),
                class,
            });
        }

        user.add_booking(flight.flight_number.clone());
        self.ledger
            .entry((user.email.to_lowercase(), flight.flight_number.to_uppercase()))
            .or_default()
            .push(class);

        debug!(
            user = %user.email,
            flight = %flight.flight_number,
            %class,
            remaining = flight.seats.remaining(class),
            "Seat booked"
        );
        Ok(flight.clone())
    }

    /// Remove the booking at zero-based `index` and return its flight number.
    pub fn cancel(
        &mut self,
        registry: &mut FlightRegistry,
        user: &mut User,
        index: usize,
    ) -> Result<String, CancelError> {
        let len = user.bookings().len();
        if len == 0 {
            return Err(CancelError::EmptyBookingList);
        }
        let removed = user
            .remove_booking(index)
            .ok_or(CancelError::InvalidIndex { index, len })?;

        let taken = self
            .ledger
            .remove(&(user.email.to_lowercase(), removed.to_uppercase()))
            .unwrap_or_default();
        if self.restore_seats_on_cancel {
            if let Some(flight) = registry.find_by_number_mut(&removed) {
                for class in &taken {
                    flight.seats.release(*class, 1);
                }
            }
        }

        debug!(
            user = %user.email,
            flight = %removed,
            restored = if self.restore_seats_on_cancel { taken.len() } else { 0 },
            "Booking cancelled"
        );
        Ok(removed)
    }
}

/// Resolve each booking reference against the registry as it is now.
pub fn describe_bookings<'a>(
    user: &'a User,
    registry: &'a FlightRegistry,
) -> impl Iterator<Item = (&'a str, Option<&'a Flight>)> + 'a {
    user.bookings()
        .iter()
        .map(move |flight_number| (flight_number.as_str(), registry.find_by_number(flight_number)))
}

/// Each user paired with the first of their bookings found on the board.
///
/// Users whose bookings all dangle are skipped; a user appears at most once.
pub fn boarding_users<'a>(
    users: &'a [User],
    registry: &'a FlightRegistry,
) -> impl Iterator<Item = (&'a User, &'a Flight)> + 'a {
    let mut seen = HashSet::new();
    users.iter().filter_map(move |user| {
        if !seen.insert(user.email.to_lowercase()) {
            return None;
        }
        user.bookings()
            .iter()
            .find_map(|flight_number| registry.find_by_number(flight_number))
            .map(|flight| (user, flight))
    })
}

/// Give the first four users a booking on FL100..FL103, seeding those
/// flights when missing. No seats are deducted. Returns the bookings added.
pub fn assign_default_bookings<R: Rng + ?Sized>(
    registry: &mut FlightRegistry,
    users: &mut [User],
    rng: &mut R,
) -> usize {
    let template = FlightTemplate::default();
    let mut added = 0;
    for (user, flight_number) in users.iter_mut().zip(BASELINE_FLIGHTS) {
        registry.ensure_seeded(&[flight_number], &template, rng);
        if user.add_booking(flight_number) {
            added += 1;
        }
    }
    if added > 0 {
        info!(added, "Assigned default bookings");
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatInventory;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};

    fn registry_with(number: &str, status: FlightStatus, seats: SeatInventory) -> FlightRegistry {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let mut registry = FlightRegistry::new(date);
        let template = FlightTemplate {
            status,
            ..FlightTemplate::default()
        };
        registry.insert(template.build(number, date, seats));
        registry
    }

    fn remaining(registry: &FlightRegistry, number: &str, class: FareClass) -> u32 {
        registry
            .find_by_number(number)
            .expect("flight present")
            .seats()
            .remaining(class)
    }

    #[test]
    fn last_seat_goes_to_first_caller() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(1, 5, 5));
        let mut service = BookingService::default();
        let mut first = User::new("Dharani", "dharani@gmail.com");
        let mut second = User::new("Pavi", "pavi@gmail.com");

        let snapshot = service
            .book(&mut registry, &mut first, "FL100", "Economy")
            .expect("first booking succeeds");
        assert_eq!(snapshot.seats().remaining(FareClass::Economy), 0);
        assert_eq!(first.bookings(), ["FL100".to_string()]);

        let err = service
            .book(&mut registry, &mut second, "FL100", "Economy")
            .expect_err("economy sold out");
        assert_eq!(
            err,
            BookingError::SoldOut {
                flight_number: "FL100".to_string(),
                class: FareClass::Economy,
            }
        );
        assert!(second.bookings().is_empty());
        assert_eq!(remaining(&registry, "FL100", FareClass::Economy), 0);
        assert_eq!(remaining(&registry, "FL100", FareClass::Business), 5);
    }

    #[test]
    fn rejections_are_checked_in_order() {
        let mut registry =
            registry_with("FL300", FlightStatus::Cancelled, SeatInventory::new(0, 0, 0));
        let mut service = BookingService::default();
        let mut user = User::new("Aravind", "aravind@gmail.com");

        assert_eq!(
            service.book(&mut registry, &mut user, "FL404", "Premium"),
            Err(BookingError::NotFound("FL404".to_string()))
        );
        assert!(matches!(
            service.book(&mut registry, &mut user, "fl300", "Premium"),
            Err(BookingError::NotBookable { status: FlightStatus::Cancelled, .. })
        ));

        let mut registry =
            registry_with("FL301", FlightStatus::Boarding, SeatInventory::new(3, 3, 3));
        assert_eq!(
            service.book(&mut registry, &mut user, "FL301", "Premium"),
            Err(BookingError::InvalidClass("Premium".to_string()))
        );
        assert!(user.bookings().is_empty());
        assert_eq!(remaining(&registry, "FL301", FareClass::Economy), 3);

        let mut registry =
            registry_with("FL302", FlightStatus::Scheduled, SeatInventory::new(0, 0, 0));
        assert_eq!(
            service.book(&mut registry, &mut user, "FL302", "Premium"),
            Err(BookingError::InvalidClass("Premium".to_string()))
        );
        assert!(matches!(
            service.book(&mut registry, &mut user, "FL302", "Economy"),
            Err(BookingError::SoldOut { class: FareClass::Economy, .. })
        ));
        assert!(user.bookings().is_empty());
    }

    #[test]
    fn rebooking_same_flight_takes_two_seats_but_one_reference() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(10, 10, 10));
        let mut service = BookingService::default();
        let mut user = User::new("Jaiwin", "jaiwin@gmail.com");

        service
            .book(&mut registry, &mut user, "FL100", "Economy")
            .expect("first booking");
        service
            .book(&mut registry, &mut user, "fl100", "business")
            .expect("second booking");

        assert_eq!(user.bookings(), ["FL100".to_string()]);
        assert_eq!(remaining(&registry, "FL100", FareClass::Economy), 9);
        assert_eq!(remaining(&registry, "FL100", FareClass::Business), 9);
    }

    #[test]
    fn cancel_validates_list_and_index() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(10, 10, 10));
        let mut service = BookingService::default();
        let mut user = User::new("Pavi", "pavi@gmail.com");

        assert_eq!(
            service.cancel(&mut registry, &mut user, 0),
            Err(CancelError::EmptyBookingList)
        );
        assert!(user.bookings().is_empty());

        service
            .book(&mut registry, &mut user, "FL100", "FirstClass")
            .expect("booking");
        assert_eq!(
            service.cancel(&mut registry, &mut user, 1),
            Err(CancelError::InvalidIndex { index: 1, len: 1 })
        );
        assert_eq!(
            service.cancel(&mut registry, &mut user, 0),
            Ok("FL100".to_string())
        );
        assert!(user.bookings().is_empty());
    }

    #[test]
    fn cancel_keeps_seats_by_default() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(10, 10, 10));
        let mut service = BookingService::default();
        let mut user = User::new("Pavi", "pavi@gmail.com");

        service
            .book(&mut registry, &mut user, "FL100", "Economy")
            .expect("booking");
        service
            .cancel(&mut registry, &mut user, 0)
            .expect("cancel");
        assert_eq!(remaining(&registry, "FL100", FareClass::Economy), 9);
    }

    #[test]
    fn cancel_restores_session_seats_when_enabled() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(10, 10, 10));
        let mut service = BookingService::new(true);
        let mut user = User::new("Pavi", "pavi@gmail.com");
        user.add_booking("FL999");

        service
            .book(&mut registry, &mut user, "FL100", "Economy")
            .expect("booking");
        service
            .book(&mut registry, &mut user, "FL100", "Business")
            .expect("booking");
        assert_eq!(
            service.cancel(&mut registry, &mut user, 1),
            Ok("FL100".to_string())
        );
        assert_eq!(remaining(&registry, "FL100", FareClass::Economy), 10);
        assert_eq!(remaining(&registry, "FL100", FareClass::Business), 10);

        // Dangling reference with no recorded seats.
        assert_eq!(
            service.cancel(&mut registry, &mut user, 0),
            Ok("FL999".to_string())
        );
    }

    #[test]
    fn describe_bookings_resolves_against_current_registry() {
        let mut registry =
            registry_with("FL100", FlightStatus::Scheduled, SeatInventory::new(10, 10, 10));
        let mut service = BookingService::default();
        let mut user = User::new("Pavi", "pavi@gmail.com");
        user.add_booking("FL555");
        service
            .book(&mut registry, &mut user, "FL100", "Economy")
            .expect("booking");

        let described: Vec<_> = describe_bookings(&user, &registry)
            .map(|(number, flight)| {
                (
                    number.to_string(),
                    flight.map(|f| f.seats().remaining(FareClass::Economy)),
                )
            })
            .collect();
        assert_eq!(
            described,
            vec![
                ("FL555".to_string(), None),
                ("FL100".to_string(), Some(9)),
            ]
        );
    }

    #[test]
    fn boarding_users_lists_first_resolved_booking_once() {
        let registry =
            registry_with("FL100", FlightStatus::Boarding, SeatInventory::new(10, 10, 10));
        let mut dharani = User::new("Dharani", "dharani@gmail.com");
        dharani.add_booking("FL404");
        dharani.add_booking("FL100");
        let mut ghost = User::new("Ghost", "ghost@gmail.com");
        ghost.add_booking("FL404");
        let users = vec![dharani, ghost, User::new("Pavi", "pavi@gmail.com")];

        let boarding: Vec<_> = boarding_users(&users, &registry)
            .map(|(user, flight)| (user.name.as_str(), flight.flight_number.as_str()))
            .collect();
        assert_eq!(boarding, vec![("Dharani", "FL100")]);
    }

    #[test]
    fn default_bookings_cover_first_four_users() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let mut registry = FlightRegistry::new(date);
        let mut rng = StdRng::seed_from_u64(3);
        let mut users: Vec<User> = (0..5)
            .map(|i| User::new(format!("User {i}"), format!("user{i}@gmail.com")))
            .collect();

        assert_eq!(assign_default_bookings(&mut registry, &mut users, &mut rng), 4);
        assert_eq!(assign_default_bookings(&mut registry, &mut users, &mut rng), 0);
        assert_eq!(registry.len(), 4);
        for (user, number) in users.iter().zip(BASELINE_FLIGHTS) {
            assert_eq!(user.bookings(), [number.to_string()]);
        }
        assert!(users[4].bookings().is_empty());
    }
}
