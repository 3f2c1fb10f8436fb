//! Named databases in the JSON interchange format
//!
//! ```json
//! {
//!   "name": "University",
//!   "description": "optional",
//!   "tables": { "Students": [{ "id": 1, "name": "Alice" }] },
//!   "examples": ["π[name](Students)"],
//!   "mermaidSchema": "optional erDiagram source"
//! }
//! ```

use std::fmt::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use relalg::{Relation, RelationLookup, Value, row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid database JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid database format: {0}")]
    Invalid(String),

    #[error("unknown database: {0}")]
    Unknown(String),
}

type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tables: IndexMap<String, Relation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Hand-written ER diagram; derived from the tables when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mermaid_schema: Option<String>,
}

impl Database {
    pub fn from_json(json: &str) -> Result<Self> {
        let db: Database = serde_json::from_str(json)?;
        if db.name.trim().is_empty() {
            return Err(DatabaseError::Invalid(
                "the \"name\" field must not be empty".to_string(),
            ));
        }
        Ok(db)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DatabaseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_json(&json)?;
        log::info!(
            "loaded database {:?} with {} tables from {}",
            db.name,
            db.tables.len(),
            path.display()
        );
        Ok(db)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `University Records` -> `university-records.json`
    pub fn export_file_name(&self) -> String {
        let slug = self
            .name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        format!("{slug}.json")
    }

    /// Write the database into `dir` under [`Self::export_file_name`]
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.export_file_name());
        std::fs::write(&path, self.to_json()?).map_err(|source| DatabaseError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("exported database {:?} to {}", self.name, path.display());
        Ok(path)
    }

    /// The hand-written schema if there is one, otherwise a derived one
    pub fn schema(&self) -> String {
        match &self.mermaid_schema {
            Some(schema) => schema.clone(),
            None => derive_schema(&self.tables),
        }
    }

    /// Built-in sample dataset
    pub fn sample() -> Self {
        let students = Relation::from_rows(vec![
            row! { "id" => 1, "name" => "Alice", "age" => 22, "major" => "CS" },
            row! { "id" => 2, "name" => "Bob", "age" => 28, "major" => "Math" },
            row! { "id" => 3, "name" => "Charlie", "age" => 25, "major" => "CS" },
            row! { "id" => 4, "name" => "Diana", "age" => 23, "major" => "Physics" },
            row! { "id" => 5, "name" => "Eve", "age" => 30, "major" => "Math" },
        ]);
        let teachers = Relation::from_rows(vec![
            row! { "id" => 101, "name" => "Prof. Smith", "age" => 45, "subject" => "CS" },
            row! { "id" => 102, "name" => "Prof. Jones", "age" => 38, "subject" => "Math" },
            row! { "id" => 103, "name" => "Alice", "age" => 22, "subject" => "Physics" },
        ]);
        let enrollments = Relation::from_rows(vec![
            row! { "student_id" => 1, "course" => "Database Systems", "grade" => "A" },
            row! { "student_id" => 2, "course" => "Algorithms", "grade" => "B" },
            row! { "student_id" => 3, "course" => "Database Systems", "grade" => "A" },
            row! { "student_id" => 1, "course" => "Machine Learning", "grade" => "B" },
            row! { "student_id" => 4, "course" => "Physics 101", "grade" => "A" },
        ]);

        Database {
            name: "University".to_string(),
            description: Some("Students, teachers and course enrollments".to_string()),
            tables: IndexMap::from([
                ("Students".to_string(), students),
                ("Teachers".to_string(), teachers),
                ("Enrollments".to_string(), enrollments),
            ]),
            examples: [
                "π[name,age](Students)",
                "σ[age>25](Students)",
                "π[name](σ[age>25](Students))",
                "Students ∪ Teachers",
                "π[name](Students) ∪ π[name](Teachers)",
                "Students ⋈_{id=student_id} Enrollments",
                "π[name,course](Students ⋈_{id=student_id} Enrollments)",
            ]
            .map(String::from)
            .to_vec(),
            mermaid_schema: None,
        }
    }
}

impl RelationLookup for Database {
    fn relation(&self, name: &str) -> Option<&Relation> {
        self.tables.get(name)
    }
}

/// Mermaid `erDiagram` from the first row of every non-empty table
pub fn derive_schema(tables: &IndexMap<String, Relation>) -> String {
    let mut schema = String::from("erDiagram\n");
    for (table, relation) in tables {
        let Some(first) = relation.rows().first() else {
            continue;
        };
        let _ = writeln!(schema, "    {table} {{");
        for (attr, value) in first {
            let ty = match value {
                Value::Number(_) => "int",
                Value::Bool(_) => "boolean",
                Value::String(_) => "string",
            };
            let key = if attr == "id" {
                " PK"
            } else if attr.ends_with("_id") {
                " FK"
            } else {
                ""
            };
            let _ = writeln!(schema, "        {ty} {attr}{key}");
        }
        schema.push_str("    }\n");
    }
    schema
}

// ============ Catalog ============

/// The set of loaded databases and which one queries run against
#[derive(Debug, Clone)]
pub struct Catalog {
    databases: Vec<Database>,
    current: usize,
}

impl Catalog {
    /// A catalog holding only the sample database
    pub fn new() -> Self {
        Self {
            databases: vec![Database::sample()],
            current: 0,
        }
    }

    /// Add a database and make it current
    pub fn add(&mut self, db: Database) {
        self.databases.push(db);
        self.current = self.databases.len() - 1;
    }

    /// Make the database called `name` current
    pub fn switch_to(&mut self, name: &str) -> Result<&Database> {
        let index = self
            .databases
            .iter()
            .position(|db| db.name == name)
            .ok_or_else(|| DatabaseError::Unknown(name.to_string()))?;
        self.current = index;
        Ok(&self.databases[index])
    }

    pub fn current(&self) -> &Database {
        &self.databases[self.current]
    }

    pub fn databases(&self) -> &[Database] {
        &self.databases
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "name": "Game Store",
        "tables": {
            "Games": [{ "id": 1, "title": "Doom", "price": 9.5, "retro": true }],
            "Sales": [{ "game_id": 1, "qty": 3 }],
            "Empty": []
        },
        "examples": ["π[title](Games)"]
    }"#;

    #[test]
    fn load_from_json() {
        let db = Database::from_json(SMALL).unwrap();
        assert_eq!(db.name, "Game Store");
        assert_eq!(db.tables.len(), 3);
        assert_eq!(db.examples, vec!["π[title](Games)"]);
        assert!(db.relation("Games").is_some());
        assert!(db.relation("Missing").is_none());
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            Database::from_json(r#"{ "name": "x" }"#),
            Err(DatabaseError::Json(_))
        ));
        assert!(matches!(
            Database::from_json(r#"{ "name": " ", "tables": {} }"#),
            Err(DatabaseError::Invalid(_))
        ));
        assert!(Database::from_json(r#"{ "name": "x", "tables": { "T": [{ "a": null }] } }"#).is_err());
    }

    #[test]
    fn export_file_name_is_slugged() {
        let mut db = Database::sample();
        db.name = "My  Big\tLibrary".to_string();
        assert_eq!(db.export_file_name(), "my-big-library.json");
    }

    #[test]
    fn export_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::from_json(SMALL).unwrap();
        let path = db.export_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "game-store.json");
        assert_eq!(Database::load(&path).unwrap(), db);
    }

    #[test]
    fn derived_schema() {
        let db = Database::from_json(SMALL).unwrap();
        assert_eq!(
            db.schema(),
            "erDiagram\n    Games {\n        int id PK\n        string title\n        int price\n        boolean retro\n    }\n    Sales {\n        int game_id FK\n        int qty\n    }\n"
        );
    }

    #[test]
    fn catalog_switching() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.current().name, "University");
        catalog.add(Database::from_json(SMALL).unwrap());
        assert_eq!(catalog.current().name, "Game Store");
        catalog.switch_to("University").unwrap();
        assert_eq!(catalog.current().name, "University");
        assert!(catalog.switch_to("Nope").is_err());
        assert_eq!(catalog.databases().len(), 2);
    }

    #[test]
    fn sample_examples_all_run() {
        let db = Database::sample();
        for query in &db.examples {
            let steps = relalg::run(query, &db).unwrap();
            assert!(!steps.last().unwrap().data.is_empty(), "{query} returned no rows");
        }
    }
}
