use chrono::NaiveDate;

use crate::schema::RawEntity;

/// Object storage layout of distributor extracts:
/// `<base>/distributor_<id>/<entity>/<YYYY-MM-DD>.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    base: String,
}

impl SourceLayout {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn source_uri(&self, distributor: u32, entity: RawEntity, date: NaiveDate) -> String {
        format!(
            "{}/distributor_{}/{}/{}.csv",
            self.base,
            distributor,
            entity.table_name(),
            date.format("%Y-%m-%d")
        )
    }

    /// Remote bases need the engine's httpfs extension
    pub fn is_remote(&self) -> bool {
        ["gs://", "gcs://", "s3://", "http://", "https://"]
            .iter()
            .any(|scheme| self.base.starts_with(scheme))
    }
}
