//! CSV reports.
//!
//! A report is a serde-serializable row type registered with `define_report!`.
//! Each report type is bound to one writer with `add_report` or
//! `add_report_writer`, and rows are sent to it with `send_report`.
//!
//! Files added with `add_report` are written to a temporary file next to the
//! destination and only moved into place by `finish_reports`. A replication
//! that fails part way therefore never leaves a truncated report behind.
use std::any::TypeId;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use tempfile::{NamedTempFile, TempPath};

use crate::context::Context;
use crate::error::SeirsError;
use crate::log::trace;
use crate::HashMap;

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<Box<dyn Write>>) -> Result<(), SeirsError>;
}

/// Use this macro to define a unique report type
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<Box<dyn std::io::Write>>,
            ) -> Result<(), $crate::error::SeirsError> {
                writer.serialize(self)?;
                Ok(())
            }
        }
    };
}
pub use define_report;

struct PendingFile {
    temp_path: TempPath,
    destination: PathBuf,
}

struct ReportData {
    writers: RefCell<HashMap<TypeId, Writer<Box<dyn Write>>>>,
    pending_files: Vec<PendingFile>,
}

// Registers a data container that stores
// * writers: Maps report type to its CSV writer
// * pending_files: Temporary files to move into place once the run finishes
crate::context::define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        writers: RefCell::new(HashMap::default()),
        pending_files: Vec::new(),
    }
);

// Checks that the path is a CSV file and creates its parent directories.
// Returns a temporary file in the same directory, so that it can later be
// renamed onto `path` without crossing file systems.
fn create_temp_report_file(path: &Path) -> Result<(File, TempPath), SeirsError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            create_dir_all(parent)?;
            let temp_file = NamedTempFile::new_in(parent)?;
            Ok(temp_file.into_parts())
        }
        _ => Err(SeirsError::ReportError(format!(
            "Report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

pub trait ContextReportExt {
    /// Binds report type `T` to a CSV file at `path`. The file appears only
    /// once `finish_reports` succeeds.
    ///
    /// # Errors
    ///
    /// Returns a `SeirsError` if the path is not a CSV file or its directory
    /// cannot be created or written to.
    fn add_report<T: Report>(&mut self, path: &Path) -> Result<(), SeirsError>;

    /// Binds report type `T` to an arbitrary writer.
    fn add_report_writer<T: Report>(&mut self, writer: Box<dyn Write>);

    /// Write a new row with columns following items in the report struct
    /// to the writer associated with the report type struct.
    ///
    /// # Errors
    ///
    /// Returns a `SeirsError` if no writer was added for the report type or
    /// the row cannot be written.
    fn send_report<T: Report>(&self, report: T) -> Result<(), SeirsError>;

    /// Flushes every writer and moves finished report files into place.
    ///
    /// # Errors
    ///
    /// Returns a `SeirsError` if flushing or renaming fails.
    fn finish_reports(&mut self) -> Result<(), SeirsError>;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, path: &Path) -> Result<(), SeirsError> {
        let (file, temp_path) = create_temp_report_file(path)?;
        trace!(
            "writing report to {} via {}",
            path.display(),
            temp_path.display()
        );
        self.add_report_writer::<T>(Box::new(file));
        let data_container = self.get_data_container_mut(ReportPlugin);
        data_container.pending_files.push(PendingFile {
            temp_path,
            destination: path.to_path_buf(),
        });
        Ok(())
    }

    fn add_report_writer<T: Report>(&mut self, writer: Box<dyn Write>) {
        let data_container = self.get_data_container_mut(ReportPlugin);
        data_container
            .writers
            .get_mut()
            .insert(TypeId::of::<T>(), Writer::from_writer(writer));
    }

    fn send_report<T: Report>(&self, report: T) -> Result<(), SeirsError> {
        let missing =
            || SeirsError::ReportError("No writer found for the report type".to_string());
        // No data container will exist if no reports have been added
        let data_container = self.get_data_container(ReportPlugin).ok_or_else(missing)?;
        let mut writers = data_container.writers.borrow_mut();
        let writer = writers.get_mut(&report.type_id()).ok_or_else(missing)?;
        report.serialize(writer)?;
        writer.flush()?;
        Ok(())
    }

    fn finish_reports(&mut self) -> Result<(), SeirsError> {
        let data_container = self.get_data_container_mut(ReportPlugin);
        for (_, mut writer) in data_container.writers.get_mut().drain() {
            writer.flush()?;
        }
        for pending in data_container.pending_files.drain(..) {
            trace!("persisting report {}", pending.destination.display());
            pending.temp_path.persist(&pending.destination)?;
        }
        Ok(())
    }
}
