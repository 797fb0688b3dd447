use std::collections::BTreeMap;

use crate::field::Field;

/// One classification (or one reconciled subject): fields in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    /// Assemble a row from freshly parsed fields.
    ///
    /// Task fields are numbered per name group in arrival order. Plain
    /// columns keep suffix 1 and a repeat replaces the earlier value.
    pub fn from_fields(parsed: impl IntoIterator<Item = Field>) -> Self {
        let mut tally: BTreeMap<String, usize> = BTreeMap::new();
        let mut fields: Vec<Field> = Vec::new();

        for mut field in parsed {
            if field.kind().is_task() {
                let seen = tally.entry(field.name_group.clone()).or_insert(0);
                *seen += 1;
                field.suffix = *seen;
                fields.push(field);
            } else {
                field.suffix = 1;
                match fields
                    .iter_mut()
                    .find(|f| !f.kind().is_task() && f.name_group == field.name_group)
                {
                    Some(existing) => *existing = field,
                    None => fields.push(field),
                }
            }
        }

        Self { fields }
    }

    /// Wrap reconciled fields, keeping their suffixes.
    pub fn from_reconciled(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name_group: &str, suffix: usize) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.suffix == suffix && f.name_group == name_group)
    }

    /// Lookup by column key (`"name"` or `"name #2"`).
    pub fn get_column(&self, field_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.field_name() == field_name)
    }

    /// Trimmed scalar value of a plain column; `None` when absent or blank.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column, 1)
            .map(|f| f.text_value().trim())
            .filter(|v| !v.is_empty())
    }

    /// Every field except no-op and same-check columns.
    pub fn tasks(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.kind().is_task())
    }

    /// Flat record in column order, optionally with explanation columns.
    pub fn to_record(&self, reconciled: bool, add_notes: bool) -> Vec<(String, String)> {
        let mut record = Vec::new();
        for field in &self.fields {
            record.extend(field.to_flat(reconciled));
            if add_notes {
                record.push((field.note_header(), field.note.clone()));
            }
        }
        record
    }
}
