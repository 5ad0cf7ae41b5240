//! In-memory flight board.

use chrono::{Local, NaiveDate, NaiveTime};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, info};

use crate::models::{Direction, Flight, FlightStatus, SeatInventory};

const AIRLINES: [&str; 5] = ["Air India", "IndiGo", "SpiceJet", "Emirates", "Lufthansa"];
const DESTINATIONS: [&str; 5] = ["Delhi", "Mumbai", "Dubai", "Frankfurt", "London"];
const GATES: [&str; 5] = ["A1", "A2", "A3", "B1", "B2"];

/// Flight numbers guaranteed to exist for the default users.
pub const BASELINE_FLIGHTS: [&str; 4] = ["FL100", "FL101", "FL102", "FL103"];

/// Fixed attributes used when inserting a baseline flight.
#[derive(Debug, Clone)]
pub struct FlightTemplate {
    /// Operating airline.
    pub airline: String,
    /// Destination city.
    pub destination: String,
    /// Scheduled time.
    pub time: NaiveTime,
    /// Boarding gate.
    pub gate: String,
    /// Initial status.
    pub status: FlightStatus,
    /// Arrival or departure.
    pub direction: Direction,
}

impl Default for FlightTemplate {
    fn default() -> Self {
        Self {
            airline: "Air India".to_string(),
            destination: "Delhi".to_string(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            gate: "A1".to_string(),
            status: FlightStatus::Scheduled,
            direction: Direction::Departure,
        }
    }
}

impl FlightTemplate {
    /// Materialise a flight from the template.
    pub fn build(
        &self,
        flight_number: impl Into<String>,
        date: NaiveDate,
        seats: SeatInventory,
    ) -> Flight {
        Flight {
            flight_number: flight_number.into(),
            airline: self.airline.clone(),
            destination: self.destination.clone(),
            time: self.time,
            gate: self.gate.clone(),
            status: self.status,
            direction: self.direction,
            date,
            seats,
        }
    }
}

/// Owns every flight and is the only place seat counts are reachable mutably.
#[derive(Debug, Clone)]
pub struct FlightRegistry {
    flights: Vec<Flight>,
    service_date: NaiveDate,
}

impl FlightRegistry {
    /// Empty registry stamping generated flights with `service_date`.
    pub fn new(service_date: NaiveDate) -> Self {
        Self {
            flights: Vec::new(),
            service_date,
        }
    }

    /// Empty registry for the local calendar date.
    pub fn for_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// Date stamped on generated flights.
    pub fn service_date(&self) -> NaiveDate {
        self.service_date
    }

    /// All flights in insertion order.
    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    /// Number of flights on the board.
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Whether the board is empty.
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Append a flight as-is. Duplicate numbers are not rejected.
    pub fn insert(&mut self, flight: Flight) {
        self.flights.push(flight);
    }

    /// Generate and append a random flight.
    ///
    /// Flight numbers are drawn from `FL100..=FL999` without a collision
    /// check; [`FlightRegistry::find_by_number`] returns the first match.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Flight {
        let flight = Flight {
            flight_number: format!("FL{}", rng.gen_range(100..=999)),
            airline: pick(rng, &AIRLINES),
            destination: pick(rng, &DESTINATIONS),
            time: NaiveTime::from_hms_opt(rng.gen_range(8..20), rng.gen_range(0..60), 0)
                .unwrap_or(NaiveTime::MIN),
            gate: pick(rng, &GATES),
            status: FlightStatus::ALL
                .choose(rng)
                .copied()
                .unwrap_or(FlightStatus::Scheduled),
            direction: if rng.gen_bool(0.5) {
                Direction::Arrival
            } else {
                Direction::Departure
            },
            date: self.service_date,
            seats: random_seats(rng),
        };
        debug!(flight = %flight.flight_number, status = %flight.status, "Generated flight");
        self.flights.push(flight);
        &self.flights[self.flights.len() - 1]
    }

    /// Generate `count` random flights.
    pub fn generate_many<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count {
            self.generate(rng);
        }
        info!(count, total = self.flights.len(), "Flight board generated");
    }

    /// Case-insensitive exact lookup, first match wins.
    pub fn find_by_number(&self, flight_number: &str) -> Option<&Flight> {
        self.flights
            .iter()
            .find(|flight| flight.matches_number(flight_number))
    }

    pub(crate) fn find_by_number_mut(&mut self, flight_number: &str) -> Option<&mut Flight> {
        self.flights
            .iter_mut()
            .find(|flight| flight.matches_number(flight_number))
    }

    /// Flights currently open for booking, in insertion order.
    pub fn list_bookable(&self) -> impl Iterator<Item = &Flight> + '_ {
        self.flights.iter().filter(|flight| flight.is_bookable())
    }

    /// Insert a templated flight for every number not already on the board.
    ///
    /// Returns the number of flights inserted; calling it again is a no-op.
    pub fn ensure_seeded<R: Rng + ?Sized>(
        &mut self,
        flight_numbers: &[&str],
        template: &FlightTemplate,
        rng: &mut R,
    ) -> usize {
        let mut inserted = 0;
        for flight_number in flight_numbers {
            if self.find_by_number(flight_number).is_some() {
                continue;
            }
            let flight = template.build(*flight_number, self.service_date, random_seats(rng));
            self.flights.push(flight);
            inserted += 1;
        }
        if inserted > 0 {
            info!(inserted, "Seeded baseline flights");
        }
        inserted
    }
}

/// Random starting inventory: Economy 50-100, Business 10-20, FirstClass 5-10.
pub fn random_seats<R: Rng + ?Sized>(rng: &mut R) -> SeatInventory {
    SeatInventory::new(
        rng.gen_range(50..=100),
        rng.gen_range(10..=20),
        rng.gen_range(5..=10),
    )
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}
