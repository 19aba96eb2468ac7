//! Implements a struct that holds the state of the server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::DEFAULT_COOKIE_DURATION,
    db::initialize,
    period::{ConsolidationLocks, JsonFilePeriodList, PeriodList, SqlitePeriodList},
    rate::P2PClient,
    workspace::Workspaces,
};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The rate and draft transaction for each user's dashboards.
    pub workspaces: Workspaces,

    /// The client for the marketplace and ticker prices.
    pub p2p_client: P2PClient,

    /// Where consolidated periods are kept.
    pub period_list: Arc<dyn PeriodList>,

    /// Keeps consolidations of the same ledger from overlapping.
    pub consolidation_locks: ConsolidationLocks,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "America/Caracas".
    ///
    /// Periods are stored in the database unless `periods_file` is given, in
    /// which case they are stored in that JSON file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        p2p_client: P2PClient,
        periods_file: Option<PathBuf>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        let period_list: Arc<dyn PeriodList> = match periods_file {
            Some(path) => {
                tracing::info!("Storing periods in {}", path.display());
                Arc::new(JsonFilePeriodList::new(path))
            }
            None => Arc::new(SqlitePeriodList::new(connection.clone())),
        };

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: connection,
            workspaces: Workspaces::default(),
            p2p_client,
            period_list,
            consolidation_locks: ConsolidationLocks::default(),
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::rate::P2PClient;

    use super::{AppState, create_cookie_key};

    #[test]
    fn same_secret_gives_same_key() {
        let first = create_cookie_key("foobar");
        let second = create_cookie_key("foobar");

        assert_eq!(first.master(), second.master());
    }

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Etc/UTC",
            P2PClient::default(),
            None,
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let user_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(user_count, 0);
    }
}
