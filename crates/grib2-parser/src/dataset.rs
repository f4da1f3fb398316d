//! Named-variable access over all messages of a GRIB2 file.

use crate::{Grib2Error, Grib2Message, Grib2Reader, Grib2Tables};
use bytes::Bytes;
use precip_common::LabeledField;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// All messages of one GRIB2 file.
pub struct Grib2Dataset {
    messages: Vec<Grib2Message>,
}

impl Grib2Dataset {
    /// Read and parse a file using the precipitation lookup tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Grib2Error> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(Bytes::from(data), Arc::new(Grib2Tables::precipitation()))
    }

    pub fn from_bytes(data: Bytes, tables: Arc<Grib2Tables>) -> Result<Self, Grib2Error> {
        let messages = Grib2Reader::new(data, tables).read_all()?;
        if messages.is_empty() {
            return Err(Grib2Error::InvalidFormat(
                "No GRIB2 messages found".to_string(),
            ));
        }
        debug!(messages = messages.len(), "Parsed GRIB2 dataset");
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Grib2Message] {
        &self.messages
    }

    /// Distinct parameter names in file order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for message in &self.messages {
            if !names.contains(&message.parameter()) {
                names.push(message.parameter());
            }
        }
        names
    }

    /// Assemble every message of `name` into one field.
    ///
    /// A single message yields a 2D field. Several messages on the same
    /// grid are stacked along a step axis sorted by forecast step.
    pub fn variable(&self, name: &str) -> Result<LabeledField, Grib2Error> {
        let mut matching: Vec<&Grib2Message> = self
            .messages
            .iter()
            .filter(|m| m.parameter() == name)
            .collect();

        let first = match matching.first() {
            Some(first) => *first,
            None => return Err(Grib2Error::VariableNotFound(name.to_string())),
        };

        let grid = first.grid_spec()?;
        for message in &matching[1..] {
            if message.grid_spec()? != grid {
                return Err(Grib2Error::InvalidFormat(format!(
                    "Messages of '{}' use different grids",
                    name
                )));
            }
        }

        let latitudes = grid.latitudes();
        let longitudes = grid.longitudes();
        let shape_error = |e: precip_common::FieldShapeError| Grib2Error::InvalidFormat(format!("{}", e));

        if matching.len() == 1 {
            let values = first.field_values()?;
            return LabeledField::new(name, latitudes, longitudes, values).map_err(shape_error);
        }

        let mut keyed = Vec::with_capacity(matching.len());
        for message in matching.drain(..) {
            keyed.push((message.step()?, message));
        }
        keyed.sort_by_key(|(step, _)| *step);

        let mut steps = Vec::with_capacity(keyed.len());
        let mut values = Vec::with_capacity(keyed.len() * grid.len());
        for (step, message) in keyed {
            steps.push(step);
            values.extend(message.field_values()?);
        }

        debug!(variable = name, steps = steps.len(), "Stacked forecast steps");
        LabeledField::with_steps(name, steps, latitudes, longitudes, values).map_err(shape_error)
    }
}
