use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of columns a record occupies in the sheet (A through N)
pub const COLUMN_COUNT: usize = 14;

/// Header names in wire order. The sheet's first row is expected to carry these.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Component Name",
    "Figma Node ID",
    "Category",
    "Status",
    "Usage Guidelines",
    "Content Guidelines",
    "Voice & Tone",
    "Do's",
    "Don'ts",
    "Content Examples",
    "Character Limits",
    "Accessibility Notes",
    "Last Updated",
    "Updated By",
];

/// Review state of a component entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Draft,
    Review,
    Approved,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Draft, Status::Review, Status::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Review => "Review",
            Status::Approved => "Approved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Draft" => Ok(Status::Draft),
            "Review" => Ok(Status::Review),
            "Approved" => Ok(Status::Approved),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// One design-system component entry, one sheet row
///
/// Every field is free text as stored in the sheet. `status` stays a string
/// so rows written by hand with an unexpected value survive a round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Component Name")]
    pub name: String,
    #[serde(rename = "Figma Node ID")]
    pub figma_node_id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Usage Guidelines")]
    pub usage_guidelines: String,
    #[serde(rename = "Content Guidelines")]
    pub content_guidelines: String,
    #[serde(rename = "Voice & Tone")]
    pub voice_and_tone: String,
    #[serde(rename = "Do's")]
    pub dos: String,
    #[serde(rename = "Don'ts")]
    pub donts: String,
    #[serde(rename = "Content Examples")]
    pub content_examples: String,
    #[serde(rename = "Character Limits")]
    pub character_limits: String,
    #[serde(rename = "Accessibility Notes")]
    pub accessibility_notes: String,
    #[serde(rename = "Last Updated")]
    pub last_updated: String,
    #[serde(rename = "Updated By")]
    pub updated_by: String,
}

impl Record {
    /// Build a record from a data row keyed by the sheet's header row.
    /// Short rows are padded with empty strings; unknown headers are ignored.
    pub fn from_header_row(headers: &[String], row: &[String]) -> Self {
        let mut record = Record::default();
        for (index, header) in headers.iter().enumerate() {
            let value = row.get(index).cloned().unwrap_or_default();
            if let Some(slot) = record.field_mut(header.trim()) {
                *slot = value;
            }
        }
        record
    }

    fn field_mut(&mut self, header: &str) -> Option<&mut String> {
        let slot = match header {
            "Component Name" => &mut self.name,
            "Figma Node ID" => &mut self.figma_node_id,
            "Category" => &mut self.category,
            "Status" => &mut self.status,
            "Usage Guidelines" => &mut self.usage_guidelines,
            "Content Guidelines" => &mut self.content_guidelines,
            "Voice & Tone" => &mut self.voice_and_tone,
            "Do's" => &mut self.dos,
            "Don'ts" => &mut self.donts,
            "Content Examples" => &mut self.content_examples,
            "Character Limits" => &mut self.character_limits,
            "Accessibility Notes" => &mut self.accessibility_notes,
            "Last Updated" => &mut self.last_updated,
            "Updated By" => &mut self.updated_by,
            _ => return None,
        };
        Some(slot)
    }

    /// Status as written to the sheet: `Draft` when empty
    pub fn status_or_default(&self) -> &str {
        if self.status.is_empty() {
            Status::default().as_str()
        } else {
            &self.status
        }
    }

    /// Serialize into the fixed 14-column wire order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.figma_node_id.clone(),
            self.category.clone(),
            self.status_or_default().to_string(),
            self.usage_guidelines.clone(),
            self.content_guidelines.clone(),
            self.voice_and_tone.clone(),
            self.dos.clone(),
            self.donts.clone(),
            self.content_examples.clone(),
            self.character_limits.clone(),
            self.accessibility_notes.clone(),
            self.last_updated.clone(),
            self.updated_by.clone(),
        ]
    }

    /// Copy of this record with the last-updated column set
    pub fn stamped(&self, date: &str) -> Self {
        Record {
            last_updated: date.to_string(),
            ..self.clone()
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// The modal form: every record field a user can edit
///
/// `last_updated` is absent on purpose, the adapter stamps it on write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordForm {
    pub name: String,
    pub figma_node_id: String,
    pub category: String,
    pub status: String,
    pub usage_guidelines: String,
    pub content_guidelines: String,
    pub voice_and_tone: String,
    pub dos: String,
    pub donts: String,
    pub content_examples: String,
    pub character_limits: String,
    pub accessibility_notes: String,
    pub updated_by: String,
}

impl Default for RecordForm {
    fn default() -> Self {
        RecordForm {
            name: String::new(),
            figma_node_id: String::new(),
            category: String::new(),
            status: Status::default().as_str().to_string(),
            usage_guidelines: String::new(),
            content_guidelines: String::new(),
            voice_and_tone: String::new(),
            dos: String::new(),
            donts: String::new(),
            content_examples: String::new(),
            character_limits: String::new(),
            accessibility_notes: String::new(),
            updated_by: String::new(),
        }
    }
}

impl RecordForm {
    pub fn from_record(record: &Record) -> Self {
        RecordForm {
            name: record.name.clone(),
            figma_node_id: record.figma_node_id.clone(),
            category: record.category.clone(),
            status: record.status_or_default().to_string(),
            usage_guidelines: record.usage_guidelines.clone(),
            content_guidelines: record.content_guidelines.clone(),
            voice_and_tone: record.voice_and_tone.clone(),
            dos: record.dos.clone(),
            donts: record.donts.clone(),
            content_examples: record.content_examples.clone(),
            character_limits: record.character_limits.clone(),
            accessibility_notes: record.accessibility_notes.clone(),
            updated_by: record.updated_by.clone(),
        }
    }

    pub fn to_record(&self) -> Record {
        Record {
            name: self.name.clone(),
            figma_node_id: self.figma_node_id.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
            usage_guidelines: self.usage_guidelines.clone(),
            content_guidelines: self.content_guidelines.clone(),
            voice_and_tone: self.voice_and_tone.clone(),
            dos: self.dos.clone(),
            donts: self.donts.clone(),
            content_examples: self.content_examples.clone(),
            character_limits: self.character_limits.clone(),
            accessibility_notes: self.accessibility_notes.clone(),
            last_updated: String::new(),
            updated_by: self.updated_by.clone(),
        }
    }
}
