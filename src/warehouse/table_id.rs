use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, WarehouseError};
use crate::schema::quote_ident;

/// `<project>.<dataset>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId {
    pub project: String,
    pub dataset: String,
}

impl DatasetId {
    pub fn new(project: &str, dataset: &str) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
        }
    }

    pub fn table(&self, name: &str) -> TableId {
        TableId {
            project: self.project.clone(),
            dataset: self.dataset.clone(),
            name: name.to_string(),
        }
    }

    pub fn sql(&self) -> String {
        format!("{}.{}", quote_ident(&self.project), quote_ident(&self.dataset))
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.dataset)
    }
}

/// Fully qualified table identifier, `<project>.<dataset>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    pub project: String,
    pub dataset: String,
    pub name: String,
}

impl TableId {
    pub fn dataset_id(&self) -> DatasetId {
        DatasetId::new(&self.project, &self.dataset)
    }

    /// Quoted form for SQL text
    pub fn sql(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.project),
            quote_ident(&self.dataset),
            quote_ident(&self.name)
        )
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.name)
    }
}

impl FromStr for TableId {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [project, dataset, name] if parts.iter().all(|p| !p.trim().is_empty()) => Ok(Self {
                project: project.to_string(),
                dataset: dataset.to_string(),
                name: name.to_string(),
            }),
            _ => Err(WarehouseError::new(
                ErrorKind::MalformedRequest,
                s,
                "table id must have the form <project>.<dataset>.<name>",
            )),
        }
    }
}
