//! One conversion: read a course with one format, write it with another.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result, Warning};
use crate::format::{Format, FormatTable};
use crate::model::Registry;

/// Summary of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub course_title: String,
    /// Number of units below the course root.
    pub units: usize,
    /// Warnings raised while reading, then while writing.
    pub warnings: Vec<Warning>,
}

/// Read `input` as `from` and write it to `output` as `to`.
///
/// The course is fully read before anything is written; on error nothing is
/// published.
pub fn convert(
    table: &FormatTable,
    registry: &Registry,
    from: Format,
    input: &Path,
    to: Format,
    output: &Path,
) -> Result<Conversion> {
    let reader = table
        .reader(from)
        .ok_or_else(|| Error::format(from, format!("no reader registered for {from}")))?;
    let writer = table
        .writer(to)
        .ok_or_else(|| Error::format(to, format!("no writer registered for {to}")))?;

    let course = reader.read(input, registry)?;
    info!(
        title = course.title(),
        units = course.unit_count(),
        "read {from} course from {}",
        input.display()
    );

    let mut warnings = course.warnings();
    warnings.extend(writer.write(&course, output, registry)?);
    info!(warnings = warnings.len(), "wrote {to} course to {}", output.display());

    Ok(Conversion {
        course_title: course.title().to_string(),
        units: course.unit_count(),
        warnings,
    })
}
