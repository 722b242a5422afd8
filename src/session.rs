use crate::errors::SessionError;
use crate::models::{AppData, SleepRecord, SleepRecordInput, StatsResponse};
use crate::stats::build_stats;
use chrono::Local;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tracing::info;

/// One user's record collection, borrowed out of the shared document.
pub struct UserSession<'a> {
    username: String,
    records: &'a mut Vec<SleepRecord>,
}

impl AppData {
    /// Opens a session, creating an empty collection for a new user.
    pub fn login(&mut self, username: &str) -> Result<UserSession<'_>, SessionError> {
        let username = normalize_username(username)?;
        let records = self.users.entry(username.clone()).or_insert_with(|| {
            info!(user = %username, "created user");
            Vec::new()
        });
        Ok(UserSession { username, records })
    }

    /// Opens a session for an existing user only.
    pub fn session(&mut self, username: &str) -> Result<UserSession<'_>, SessionError> {
        let username = normalize_username(username)?;
        match self.users.get_mut(&username) {
            Some(records) => Ok(UserSession { username, records }),
            None => Err(SessionError::UnknownUser(username)),
        }
    }
}

fn normalize_username(username: &str) -> Result<String, SessionError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(SessionError::EmptyUsername);
    }
    Ok(username.to_string())
}

impl UserSession<'_> {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by start date and time.
    pub fn records(&self) -> Vec<SleepRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|record| (record.start_date.and_time(record.start_time), record.id));
        sorted
    }

    pub fn add(&mut self, input: &SleepRecordInput) -> Result<SleepRecord, SessionError> {
        let record = SleepRecord::from_input(self.next_id(), input)?;
        self.records.push(record.clone());
        info!(user = %self.username, id = record.id, duration = record.duration, "added record");
        Ok(record)
    }

    pub fn edit(&mut self, id: i64, input: &SleepRecordInput) -> Result<SleepRecord, SessionError> {
        let updated = SleepRecord::from_input(id, input)?;
        let slot = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(SessionError::RecordNotFound(id))?;
        *slot = updated.clone();
        info!(user = %self.username, id, duration = updated.duration, "edited record");
        Ok(updated)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), SessionError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            return Err(SessionError::RecordNotFound(id));
        }
        info!(user = %self.username, id, "deleted record");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&*self.records)
    }

    /// Replaces the whole collection. Records are kept field-for-field; one bad record
    /// rejects the whole import and leaves the collection untouched.
    pub fn import(&mut self, records: Vec<SleepRecord>) -> Result<usize, SessionError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(SessionError::DuplicateId(record.id));
            }
            record
                .validate()
                .map_err(|source| SessionError::InvalidImport { id: record.id, source })?;
        }

        *self.records = records;
        info!(user = %self.username, count = self.records.len(), "imported records");
        Ok(self.records.len())
    }

    pub fn stats(&self, window: NonZeroUsize) -> StatsResponse {
        build_stats(self.records.as_slice(), window)
    }

    // Millisecond timestamps, bumped when two records land in the same millisecond.
    fn next_id(&self) -> i64 {
        let now = Local::now().timestamp_millis();
        let max = self.records.iter().map(|record| record.id).max().unwrap_or(i64::MIN);
        now.max(max.saturating_add(1))
    }
}
