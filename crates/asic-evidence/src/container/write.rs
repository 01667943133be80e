//! Serialise a [`ContainerContent`] back into ASiC zip bytes.

use super::content::ContainerContent;
use super::errors::ContainerError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

impl ContainerContent {
    /// Write the container as a zip archive.
    ///
    /// `mimetype` is written first and stored; every other entry is deflated
    /// in bucket order. All entries carry `creation_time` (or the zip epoch
    /// when `None`) so identical content yields identical bytes.
    pub fn to_zip_bytes(
        &self,
        creation_time: Option<NaiveDateTime>,
    ) -> Result<Vec<u8>, ContainerError> {
        let modified = zip_time(creation_time);
        let stored = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(modified);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(modified);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mimetype = self.mimetype_document();
        write_entry(&mut writer, mimetype.name(), mimetype.content(), stored)?;

        for folder in self.folders() {
            writer
                .add_directory(folder.name(), deflated)
                .map_err(|source| write_error(folder.name(), source))?;
        }
        for document in self.all_documents().skip(1 + self.folders().len()) {
            write_entry(&mut writer, document.name(), document.content(), deflated)?;
        }

        let comment = self
            .zip_comment()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mimetype={}", self.container_type().mime_type()));
        writer.set_comment(comment);

        let cursor = writer
            .finish()
            .map_err(|source| write_error("<central directory>", source))?;
        Ok(cursor.into_inner())
    }
}

fn write_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    content: &[u8],
    options: SimpleFileOptions,
) -> Result<(), ContainerError> {
    writer
        .start_file(name, options)
        .map_err(|source| write_error(name, source))?;
    writer
        .write_all(content)
        .map_err(|err| write_error(name, err.into()))?;
    Ok(())
}

fn write_error(entry: &str, source: zip::result::ZipError) -> ContainerError {
    ContainerError::Write {
        entry: entry.to_string(),
        source,
    }
}

fn zip_time(creation_time: Option<NaiveDateTime>) -> zip::DateTime {
    let Some(time) = creation_time else {
        return zip::DateTime::default();
    };
    let converted = u16::try_from(time.year()).ok().and_then(|year| {
        zip::DateTime::from_date_and_time(
            year,
            time.month() as u8,
            time.day() as u8,
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
        )
        .ok()
    });
    converted.unwrap_or_else(|| {
        tracing::warn!(%time, "creation time outside zip range, using zip epoch");
        zip::DateTime::default()
    })
}
