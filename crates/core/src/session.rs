//! Startup wiring and the per-login session used by frontends.

use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::info;

use crate::{
    booking::{assign_default_bookings, BookingError, BookingService, CancelError},
    config::AppConfig,
    directory::{LoginError, LoginOutcome, UserDirectory},
    models::{Flight, User},
    registry::FlightRegistry,
    save::UserStore,
};

/// Errors surfaced by [`BookingSession`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No user is logged in.
    #[error("not logged in")]
    NotLoggedIn,
    /// Login or registration was refused.
    #[error(transparent)]
    Login(#[from] LoginError),
    /// Booking was refused.
    #[error(transparent)]
    Booking(#[from] BookingError),
    /// Cancellation was refused.
    #[error(transparent)]
    Cancel(#[from] CancelError),
}

/// Everything a frontend needs: the board, the users, and who is logged in.
///
/// Mutations that touch users are persisted through the store straight
/// away; persistence is best-effort and never fails the operation.
#[derive(Debug)]
pub struct BookingSession {
    registry: FlightRegistry,
    directory: UserDirectory,
    service: BookingService,
    store: UserStore,
    current: Option<usize>,
}

impl BookingSession {
    /// Assemble a session from already-built parts.
    pub fn new(
        registry: FlightRegistry,
        directory: UserDirectory,
        service: BookingService,
        store: UserStore,
    ) -> Self {
        Self {
            registry,
            directory,
            service,
            store,
            current: None,
        }
    }

    /// Generate today's board, load users, and hand out default bookings.
    pub fn bootstrap(config: &AppConfig) -> Self {
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut registry = FlightRegistry::for_today();
        registry.generate_many(config.initial_flights, &mut rng);

        let store = UserStore::new(config.users_path());
        let mut users = store.load();
        assign_default_bookings(&mut registry, &mut users, &mut rng);

        info!(
            flights = registry.len(),
            users = users.len(),
            store = %store.path().display(),
            "Session bootstrapped"
        );
        Self::new(
            registry,
            UserDirectory::new(users, config.email_domain.clone()),
            BookingService::new(config.restore_seats_on_cancel),
            store,
        )
    }

    /// The flight board.
    pub fn registry(&self) -> &FlightRegistry {
        &self.registry
    }

    /// Every known user.
    pub fn users(&self) -> &[User] {
        self.directory.users()
    }

    /// Domain logins must use.
    pub fn email_domain(&self) -> &str {
        self.directory.email_domain()
    }

    /// Whether cancellations give seats back.
    pub fn restores_seats_on_cancel(&self) -> bool {
        self.service.restores_seats_on_cancel()
    }

    /// The logged-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.current.and_then(|index| self.directory.user(index))
    }

    /// Log in with an existing address. Unknown addresses return
    /// [`LoginOutcome::NewUser`] and leave the session logged out.
    pub fn login(&mut self, email: &str) -> Result<LoginOutcome, SessionError> {
        let outcome = self.directory.login(email)?;
        if let LoginOutcome::Existing(index) = outcome {
            self.current = Some(index);
        }
        Ok(outcome)
    }

    /// Register and log in a new user, then persist.
    pub fn register(&mut self, name: &str, email: &str) -> Result<&User, SessionError> {
        let index = self.directory.register(name, email)?;
        self.current = Some(index);
        self.persist();
        self.current_user().ok_or(SessionError::NotLoggedIn)
    }

    /// Drop the current login.
    pub fn logout(&mut self) {
        self.current = None;
    }

    /// Book a seat for the logged-in user, then persist.
    pub fn book(&mut self, flight_number: &str, fare_class: &str) -> Result<Flight, SessionError> {
        let index = self.current.ok_or(SessionError::NotLoggedIn)?;
        let user = self
            .directory
            .user_mut(index)
            .ok_or(SessionError::NotLoggedIn)?;
        let flight = self
            .service
            .book(&mut self.registry, user, flight_number, fare_class)?;
        self.persist();
        Ok(flight)
    }

    /// Cancel the logged-in user's booking at zero-based `index`, then persist.
    pub fn cancel(&mut self, index: usize) -> Result<String, SessionError> {
        let current = self.current.ok_or(SessionError::NotLoggedIn)?;
        let user = self
            .directory
            .user_mut(current)
            .ok_or(SessionError::NotLoggedIn)?;
        let removed = self.service.cancel(&mut self.registry, user, index)?;
        self.persist();
        Ok(removed)
    }

    /// Write all users to the store (best-effort).
    pub fn persist(&self) {
        self.store.save(self.directory.users());
    }
}
