//! Schedule persistence with double-booking checks.
//!
//! Writes go through [`ScheduleRepository::create`] and
//! [`ScheduleRepository::update`], which read every active schedule, run the
//! overlap check in memory and only then write. All three steps run inside
//! [`DocumentStore::upsert_checked`], so no other write to the collection can
//! slip in between the check and the write. No repository lock is held while
//! listeners run, so a live-query listener may itself create or update.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::RepositoryConfig;
use crate::error::{Result, ScheduleError};
use crate::interval::Interval;
use crate::overlap::{find_overlaps, has_overlap};
use crate::parse::parse_date;
use crate::schedule::Schedule;
use crate::store::{Document, DocumentStore, Filter, Subscription};

pub struct ScheduleRepository<S: DocumentStore> {
    store: S,
    config: RepositoryConfig,
}

impl<S: DocumentStore> ScheduleRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    pub fn with_config(store: S, config: RepositoryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Store a new schedule unless it double-books an active one.
    ///
    /// # Errors
    /// - `InvalidInterval` if the schedule's own dates/times do not parse or are inverted.
    /// - `Overlap` if an active schedule overlaps on both dates and times.
    /// - `Store` / `Json` on persistence failures.
    pub fn create(&self, schedule: &Schedule) -> Result<()> {
        self.checked_write(schedule, None)?;
        info!(id = %schedule.id, professor = %schedule.professor_id, "schedule created");
        Ok(())
    }

    /// Replace an existing schedule. Its own stored version is excluded from
    /// the overlap check.
    ///
    /// # Errors
    /// Same as [`ScheduleRepository::create`].
    pub fn update(&self, schedule: &Schedule) -> Result<()> {
        self.checked_write(schedule, Some(&schedule.id))?;
        info!(id = %schedule.id, professor = %schedule.professor_id, "schedule updated");
        Ok(())
    }

    fn checked_write(&self, schedule: &Schedule, exclude_id: Option<&str>) -> Result<()> {
        let candidate = schedule.interval();
        if let Err(e) = candidate.parse() {
            warn!(id = %schedule.id, error = %e, "rejecting schedule with invalid date/time");
            return Err(ScheduleError::InvalidInterval {
                id: schedule.id.clone(),
                reason: e.to_string(),
            });
        }

        let doc = schedule.to_document()?;
        let result = self.store.upsert_checked(
            self.collection(),
            &Filter::active(),
            &doc.id,
            doc.data,
            &mut |active: &[Document]| {
                let existing: Vec<Interval> =
                    map_documents(active).iter().map(Schedule::interval).collect();
                match find_overlaps(&candidate, &existing, exclude_id).into_iter().next() {
                    Some(overlap) => Err(ScheduleError::Overlap {
                        id: overlap.existing_id,
                    }),
                    None => Ok(()),
                }
            },
        );

        match &result {
            Err(ScheduleError::Overlap { id: existing }) => {
                warn!(id = %schedule.id, existing = %existing, "rejecting overlapping schedule");
            }
            Err(e) => error!(id = %schedule.id, error = %e, "failed to write schedule"),
            Ok(()) => {}
        }
        result
    }

    /// Whether the given window overlaps any active schedule.
    ///
    /// Follows the validator's permissive policy: an unparseable window yields
    /// `Ok(false)`. Only store failures are errors.
    pub fn has_overlapping_schedule(
        &self,
        start_date: &str,
        end_date: &str,
        start_time: &str,
        end_time: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let candidate = Interval::new(
            exclude_id.unwrap_or_default(),
            start_date,
            end_date,
            start_time,
            end_time,
        );
        let existing = self.active_intervals()?;
        Ok(has_overlap(&candidate, &existing, exclude_id))
    }

    fn active_intervals(&self) -> Result<Vec<Interval>> {
        let docs = self.store.query_active(self.collection())?;
        Ok(map_documents(&docs).iter().map(Schedule::interval).collect())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.store
            .delete(self.collection(), id)
            .inspect_err(|e| error!(id, error = %e, "failed to delete schedule"))?;
        info!(id, "schedule deleted");
        Ok(())
    }

    /// Soft delete: the record stays but no longer blocks new schedules.
    ///
    /// # Errors
    /// Returns `ScheduleError::NotFound` if no such schedule exists.
    pub fn deactivate(&self, id: &str) -> Result<()> {
        self.store
            .update_field(self.collection(), id, "active", false.into())
            .inspect_err(|e| error!(id, error = %e, "failed to deactivate schedule"))?;
        info!(id, "schedule deactivated");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Schedule>> {
        Ok(self
            .store
            .get(self.collection(), id)?
            .as_ref()
            .and_then(Schedule::from_document))
    }

    /// Every schedule, active or not, newest first.
    pub fn all(&self) -> Result<Vec<Schedule>> {
        let docs = self.store.query(self.collection(), &Filter::new())?;
        Ok(newest_first(map_documents(&docs)))
    }

    pub fn by_professor(&self, professor_id: &str) -> Result<Vec<Schedule>> {
        let filter = Filter::new().where_eq("professorId", professor_id);
        let docs = self.store.query(self.collection(), &filter)?;
        Ok(map_documents(&docs))
    }

    pub fn active_by_professor(&self, professor_id: &str) -> Result<Vec<Schedule>> {
        let docs = self
            .store
            .query(self.collection(), &active_for(professor_id))?;
        Ok(map_documents(&docs))
    }

    /// Active schedules of a professor whose date range includes `date` (`dd/MM/yyyy`).
    ///
    /// Schedules with unparseable or inverted date ranges are left out.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidDate` if `date` itself does not parse.
    pub fn for_date(&self, professor_id: &str, date: &str) -> Result<Vec<Schedule>> {
        let target = parse_date(date)?;
        let schedules = self.active_by_professor(professor_id)?;

        Ok(schedules
            .into_iter()
            .filter(|s| {
                match (parse_date(&s.start_date), parse_date(&s.end_date)) {
                    (Ok(start), Ok(end)) => start <= target && target <= end,
                    _ => {
                        debug!(id = %s.id, "skipping schedule with unparseable dates");
                        false
                    }
                }
            })
            .collect())
    }

    /// Live view of every schedule, newest first.
    pub fn observe_all<F>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn(Vec<Schedule>) + Send + Sync + 'static,
    {
        self.store.subscribe(
            self.collection(),
            Filter::new(),
            Arc::new(move |docs: &[Document]| listener(newest_first(map_documents(docs)))),
        )
    }

    /// Live view of one professor's active schedules.
    pub fn observe_active_by_professor<F>(
        &self,
        professor_id: &str,
        listener: F,
    ) -> Result<Subscription>
    where
        F: Fn(Vec<Schedule>) + Send + Sync + 'static,
    {
        self.store.subscribe(
            self.collection(),
            active_for(professor_id),
            Arc::new(move |docs: &[Document]| listener(map_documents(docs))),
        )
    }
}

fn active_for(professor_id: &str) -> Filter {
    Filter::new()
        .where_eq("professorId", professor_id)
        .where_eq("active", true)
}

fn map_documents(docs: &[Document]) -> Vec<Schedule> {
    docs.iter().filter_map(Schedule::from_document).collect()
}

fn newest_first(mut schedules: Vec<Schedule>) -> Vec<Schedule> {
    schedules.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    schedules
}
