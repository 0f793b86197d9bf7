//! The `schedules` collection record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::interval::Interval;
use crate::store::Document;

/// Class modality taught in a schedule slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassType {
    #[default]
    #[serde(rename = "GI")]
    Gi,
    #[serde(rename = "NOGI")]
    NoGi,
}

/// A professor's recurring teaching slot.
///
/// Field names match the stored document (`professorId`, `startDate`, ...).
/// Missing fields take their defaults, so partially migrated documents still map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule {
    pub id: String,
    pub professor_id: String,
    /// Denormalized for display.
    pub professor_name: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub class_type: ClassType,
    pub active: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Uid of the admin who created the slot.
    pub created_by: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            id: String::new(),
            professor_id: String::new(),
            professor_name: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            class_type: ClassType::Gi,
            active: true,
            created_at: 0,
            created_by: String::new(),
        }
    }
}

impl Schedule {
    /// A new active schedule with a fresh id, stamped with the current time.
    pub fn new(
        professor_id: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            professor_id: professor_id.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            created_at: Utc::now().timestamp_millis(),
            ..Self::default()
        }
    }

    pub fn with_professor_name(mut self, name: impl Into<String>) -> Self {
        self.professor_name = name.into();
        self
    }

    pub fn with_class_type(mut self, class_type: ClassType) -> Self {
        self.class_type = class_type;
        self
    }

    pub fn with_created_by(mut self, uid: impl Into<String>) -> Self {
        self.created_by = uid.into();
        self
    }

    /// The date/time window this schedule occupies.
    pub fn interval(&self) -> Interval {
        Interval {
            id: self.id.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            active: self.active,
        }
    }

    /// Map a stored document, or `None` if its fields have the wrong types.
    ///
    /// A document without an `id` field takes the document key as its id.
    pub fn from_document(doc: &Document) -> Option<Schedule> {
        match serde_json::from_value::<Schedule>(doc.data.clone()) {
            Ok(mut schedule) => {
                if schedule.id.is_empty() {
                    schedule.id = doc.id.clone();
                }
                Some(schedule)
            }
            Err(e) => {
                warn!(id = %doc.id, error = %e, "dropping unmappable schedule document");
                None
            }
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        Ok(Document {
            id: self.id.clone(),
            data: serde_json::to_value(self)?,
        })
    }
}
