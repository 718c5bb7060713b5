use std::env;

/// Database configuration.
///
/// Reads from the `TRIPLAN_DATABASE_URL` environment variable. When that is
/// unset but `DB_HOST` is present, the URL is assembled from the discrete
/// `DB_*` variables used by container deployments. Falls back to
/// `postgresql://localhost:5432/triplan`.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/triplan";

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
            .unwrap_or_else(|| Self::new(Self::DEFAULT_URL))
    }

    /// Resolve a URL from an arbitrary variable lookup.
    ///
    /// Returns `None` when neither `TRIPLAN_DATABASE_URL` nor `DB_HOST` is
    /// available, so callers can continue down their own fallback chain.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if let Some(url) = lookup("TRIPLAN_DATABASE_URL") {
            return Some(Self::new(url));
        }

        let host = lookup("DB_HOST")?;
        let port = lookup("DB_PORT").unwrap_or_else(|| "5432".to_owned());
        let user = lookup("DB_USERNAME").unwrap_or_default();
        let password = lookup("DB_PASSWORD").unwrap_or_default();
        let dbname = lookup("DB_DATABASE").unwrap_or_else(|| "triplan".to_owned());

        let credentials = match (user.is_empty(), password.is_empty()) {
            (true, _) => String::new(),
            (false, true) => format!("{user}@"),
            (false, false) => format!("{user}:{password}@"),
        };

        Some(Self::new(format!(
            "postgres://{credentials}{host}:{port}/{dbname}?sslmode=disable"
        )))
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Extract the database name from the URL, ignoring any query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split('?')
            .next()
            .unwrap_or(&self.database_url);
        without_query.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Return a URL pointing at the `postgres` maintenance database on the
    /// same host. Used to issue `CREATE DATABASE` when the target DB does not
    /// yet exist.
    pub fn maintenance_url(&self) -> String {
        let (base, query) = match self.database_url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (self.database_url.as_str(), None),
        };
        let mut url = match base.rfind('/') {
            Some(pos) => format!("{}/postgres", &base[..pos]),
            None => base.to_owned(),
        };
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
