use std::fmt::Display;

use crate::{error::{Error, Result}, sql::types::{DataType, Row}};

/// Identifies a stored table: its name and the database that owns it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId {
    pub database: String,
    pub name: String,
}

impl TableId {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self { database: database.into(), name: name.into() }
    }
}

impl Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.name)
    }
}

/// Field definition, one `name type` descriptor of the schema line
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Type as declared, size hint included (e.g. `varchar(20)`)
    pub declared: String,
    pub datatype: DataType,
    /// Table name or alias the field was read through. Never persisted.
    pub source: Option<String>,
}

impl Field {
    /// Parses a `name type[(hint)]` descriptor
    pub fn from_descriptor(descriptor: &str) -> Result<Self> {
        let invalid = || Error::InvalidMetadata(format!("invalid field descriptor '{}'", descriptor));
        let parts = descriptor.split_whitespace().collect::<Vec<_>>();
        let [name, declared] = parts[..] else {
            return Err(invalid());
        };
        if !is_word(name) {
            return Err(invalid());
        }

        // Type word followed by any number of glued "(hint)" groups
        let (type_word, mut hints) = match declared.find('(') {
            Some(pos) => declared.split_at(pos),
            None => (declared, ""),
        };
        while !hints.is_empty() {
            let close = hints.find(')').ok_or_else(invalid)?;
            if !hints.starts_with('(') || !is_word(&hints[1..close]) {
                return Err(invalid());
            }
            hints = &hints[close + 1..];
        }

        let datatype = DataType::from_type_name(type_word).ok_or_else(|| {
            Error::InvalidMetadata(format!("unknown type '{}' for field {}", type_word, name))
        })?;
        Ok(Self {
            name: name.to_string(),
            declared: declared.to_string(),
            datatype,
            source: None,
        })
    }

    pub fn descriptor(&self) -> String {
        format!("{} {}", self.name, self.declared)
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Ordered field list of a table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    /// Decodes a persisted schema line (`name type|name type|...`)
    pub fn decode(line: &str) -> Result<Self> {
        Self::from_descriptors(line.trim().split('|'))
    }

    pub fn encode(&self) -> String {
        self.fields.iter().map(Field::descriptor).collect::<Vec<_>>().join("|")
    }

    /// Builds a schema from free-form descriptors, rejecting duplicate names
    pub fn from_descriptors<I, S>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schema = Schema::default();
        for descriptor in descriptors {
            schema.add_field(Field::from_descriptor(descriptor.as_ref())?)?;
        }
        if schema.fields.is_empty() {
            return Err(Error::InvalidMetadata("a table needs at least one field".into()));
        }
        Ok(schema)
    }

    /// Appends a field, keeping the existing order
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(Error::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Tags every field with the table name or alias it is read through
    pub fn qualify(&mut self, source: &str) {
        for field in self.fields.iter_mut() {
            field.source = Some(source.to_string());
        }
    }

    /// Concatenates two schemas, as a join does. Names may repeat across sides.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        Schema { fields }
    }

    /// Looks a field up by name and optional qualifier. Matching more than one
    /// field is an error.
    pub fn find(&self, qualifier: Option<&str>, name: &str) -> Result<Option<usize>> {
        let mut found = self.fields.iter().enumerate().filter(|(_, f)| {
            f.name == name && qualifier.is_none_or(|q| f.source.as_deref() == Some(q))
        });
        match (found.next(), found.next()) {
            (None, _) => Ok(None),
            (Some((pos, _)), None) => Ok(Some(pos)),
            (Some(_), Some(_)) => Err(Error::UnknownField(format!("{} is ambiguous", name))),
        }
    }

    /// Same as find, but a missing field is an error
    pub fn resolve(&self, qualifier: Option<&str>, name: &str) -> Result<usize> {
        self.find(qualifier, name)?.ok_or_else(|| {
            Error::UnknownField(match qualifier {
                Some(q) => format!("{}.{}", q, name),
                None => name.to_string(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// In-memory table: schema plus records in file order
///
/// Tables derived by projection or join keep the id of their (left) source and
/// are never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: TableId,
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(id: TableId, schema: Schema) -> Self {
        Self { id, schema, rows: Vec::new() }
    }

    /// Adds a record, which must carry exactly one value per field
    pub fn push(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::RecordConversion(format!(
                "table {} has {} fields, got {} values",
                self.id.name,
                self.schema.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }
}
