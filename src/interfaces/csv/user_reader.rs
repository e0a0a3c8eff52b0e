use crate::domain::user::User;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: u64,
    email: String,
    auth_token: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    is_activated: Option<bool>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            auth_token: record.auth_token,
            phone_number: record.phone_number.filter(|p| !p.is_empty()),
            is_activated: record.is_activated.unwrap_or(false),
        }
    }
}

/// Reads account seed data from a CSV source.
///
/// Expected header: `id,email,auth_token,phone_number,is_activated`. The last
/// two columns may be left empty.
pub struct UserReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> UserReader<R> {
    /// Creates a new `UserReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes users, one
    /// `Result` per row so a bad row does not stop the rest.
    pub fn users(self) -> impl Iterator<Item = Result<User>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map(|record: UserRecord| User::from(record))
                .map_err(PaymentError::from)
        })
    }
}
