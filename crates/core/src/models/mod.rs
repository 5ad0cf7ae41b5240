//! Shared domain models.

use std::{collections::BTreeMap, fmt};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Operational status of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    /// On schedule and open for booking.
    Scheduled,
    /// Running late.
    Delayed,
    /// Passengers are boarding; still open for booking.
    Boarding,
    /// Will not operate.
    Cancelled,
    /// Already arrived.
    Landed,
}

impl FlightStatus {
    /// Every status, in board order.
    pub const ALL: [FlightStatus; 5] = [
        FlightStatus::Scheduled,
        FlightStatus::Delayed,
        FlightStatus::Boarding,
        FlightStatus::Cancelled,
        FlightStatus::Landed,
    ];

    /// Upper-case label shown on the flight board.
    pub fn label(self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Boarding => "BOARDING",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Landed => "LANDED",
        }
    }

    /// Whether seats on a flight with this status may be sold.
    pub fn is_bookable(self) -> bool {
        matches!(self, FlightStatus::Scheduled | FlightStatus::Boarding)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the flight arrives at or departs from the local airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Inbound flight; `destination` names the origin.
    Arrival,
    /// Outbound flight.
    Departure,
}

impl Direction {
    /// Short label used by the board's TO/FROM column.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Arrival => "FROM",
            Direction::Departure => "TO",
        }
    }
}

/// Seat-inventory bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FareClass {
    /// Economy cabin.
    Economy,
    /// Business cabin.
    Business,
    /// First class cabin.
    FirstClass,
}

impl FareClass {
    /// The closed set of fare classes.
    pub const ALL: [FareClass; 3] = [FareClass::Economy, FareClass::Business, FareClass::FirstClass];

    /// Canonical name, as accepted by [`FareClass::parse`].
    pub fn name(self) -> &'static str {
        match self {
            FareClass::Economy => "Economy",
            FareClass::Business => "Business",
            FareClass::FirstClass => "FirstClass",
        }
    }

    /// Case-insensitive lookup by canonical name.
    pub fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for FareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Remaining seats per fare class. Counts are unsigned, so they can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInventory {
    seats: BTreeMap<FareClass, u32>,
}

impl SeatInventory {
    /// Build an inventory with explicit counts.
    pub fn new(economy: u32, business: u32, first_class: u32) -> Self {
        Self {
            seats: BTreeMap::from([
                (FareClass::Economy, economy),
                (FareClass::Business, business),
                (FareClass::FirstClass, first_class),
            ]),
        }
    }

    /// Seats left in `class`.
    pub fn remaining(&self, class: FareClass) -> u32 {
        self.seats.get(&class).copied().unwrap_or(0)
    }

    /// Iterate `(class, remaining)` pairs in fare-class order.
    pub fn iter(&self) -> impl Iterator<Item = (FareClass, u32)> + '_ {
        FareClass::ALL
            .into_iter()
            .map(move |class| (class, self.remaining(class)))
    }

    /// Take one seat, returning `false` when the class is sold out.
    pub(crate) fn take_one(&mut self, class: FareClass) -> bool {
        match self.seats.get_mut(&class) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn release(&mut self, class: FareClass, seats: u32) {
        let count = self.seats.entry(class).or_insert(0);
        *count = count.saturating_add(seats);
    }
}

/// A single flight on the board along with its seat inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Flight number such as `FL123`.
    pub flight_number: String,
    /// Operating airline.
    pub airline: String,
    /// Destination for departures, origin for arrivals.
    pub destination: String,
    /// Scheduled local time.
    pub time: NaiveTime,
    /// Boarding gate.
    pub gate: String,
    /// Current status.
    pub status: FlightStatus,
    /// Arrival or departure.
    pub direction: Direction,
    /// Service date.
    pub date: NaiveDate,
    /// Remaining seats per class. Only the booking service mutates this.
    pub(crate) seats: SeatInventory,
}

impl Flight {
    /// Seat inventory snapshot.
    pub fn seats(&self) -> &SeatInventory {
        &self.seats
    }

    /// `HH:MM` rendering of the scheduled time.
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// `YYYY-MM-DD` rendering of the service date.
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Case-insensitive flight number comparison.
    pub fn matches_number(&self, flight_number: &str) -> bool {
        self.flight_number.eq_ignore_ascii_case(flight_number.trim())
    }

    /// Whether the flight currently accepts bookings.
    pub fn is_bookable(&self) -> bool {
        self.status.is_bookable()
    }
}

/// A registered traveller and the flights they hold bookings on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Lower-case login email.
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_bookings")]
    bookings: Vec<String>,
}

impl User {
    /// Create a user with no bookings.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            bookings: Vec::new(),
        }
    }

    /// Booked flight numbers in booking order.
    pub fn bookings(&self) -> &[String] {
        &self.bookings
    }

    /// Whether the user already holds a booking on `flight_number`.
    pub fn has_booking(&self, flight_number: &str) -> bool {
        self.bookings
            .iter()
            .any(|booked| booked.eq_ignore_ascii_case(flight_number))
    }

    /// Append a booking reference; returns `false` if it was already present.
    pub fn add_booking(&mut self, flight_number: impl Into<String>) -> bool {
        let flight_number = flight_number.into();
        if self.has_booking(&flight_number) {
            return false;
        }
        self.bookings.push(flight_number);
        true
    }

    pub(crate) fn remove_booking(&mut self, index: usize) -> Option<String> {
        (index < self.bookings.len()).then(|| self.bookings.remove(index))
    }
}

fn deserialize_bookings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    let mut result: Vec<String> = Vec::with_capacity(raw.len());
    for flight_number in raw {
        if !result
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&flight_number))
        {
            result.push(flight_number);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_class_parse_is_case_insensitive() {
        assert_eq!(FareClass::parse("economy"), Some(FareClass::Economy));
        assert_eq!(FareClass::parse(" FIRSTCLASS "), Some(FareClass::FirstClass));
        assert_eq!(FareClass::parse("Premium"), None);
    }

    #[test]
    fn inventory_never_drops_below_zero() {
        let mut seats = SeatInventory::new(1, 0, 2);
        assert!(seats.take_one(FareClass::Economy));
        assert!(!seats.take_one(FareClass::Economy));
        assert!(!seats.take_one(FareClass::Business));
        assert_eq!(seats.remaining(FareClass::Economy), 0);
        assert_eq!(seats.remaining(FareClass::Business), 0);
        assert_eq!(seats.remaining(FareClass::FirstClass), 2);
    }

    #[test]
    fn user_bookings_have_no_duplicates() {
        let mut user = User::new("Pavi", "pavi@gmail.com");
        assert!(user.add_booking("FL100"));
        assert!(!user.add_booking("fl100"));
        assert_eq!(user.bookings(), ["FL100".to_string()]);
        assert_eq!(user.remove_booking(3), None);
        assert_eq!(user.remove_booking(0).as_deref(), Some("FL100"));
    }

    #[test]
    fn deserializing_drops_duplicate_bookings() {
        let user: User = serde_json::from_str(
            r#"{"name":"Pavi","email":"pavi@gmail.com","bookings":["FL100","FL101","fl100"]}"#,
        )
        .expect("valid user json");
        assert_eq!(user.bookings(), ["FL100".to_string(), "FL101".to_string()]);
    }
}
