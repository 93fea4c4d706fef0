//! Input files used across integration tests

use std::path::PathBuf;
use tempfile::TempDir;
use timetable_client::SourceFile;

/// Course list where the faculty column has a non-standard name
pub const COURSES_CSV: &str = "Course code,Prof,Type,Credits\n\
CS101,Dr. Rao,Core,4\n\
MA201,Dr. Iyer,Elective,3\n";

/// Faculty busy slots
pub const FACULTY_CSV: &str = "Name,Busy Slot\n\
Dr. Rao,Mon 09:00\n\
Dr. Iyer,Tue 11:00\n";

/// Stand-in for an Excel workbook; only the zip magic matters to the client
pub const STUDENTS_XLSX: &[u8] = &[0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x06, 0x00];

/// Where each input was written, plus the directory keeping them alive
pub struct InputFiles {
    pub dir: TempDir,
    pub paths: Vec<(SourceFile, PathBuf)>,
}

/// Write the three inputs under names that do not mention their file type
pub fn write_inputs() -> InputFiles {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let inputs: [(SourceFile, &str, &[u8]); 3] = [
        (SourceFile::Courses, "course_list.csv", COURSES_CSV.as_bytes()),
        (SourceFile::Faculty, "prefs.csv", FACULTY_CSV.as_bytes()),
        (SourceFile::Students, "enrolment.xlsx", STUDENTS_XLSX),
    ];

    let paths = inputs
        .into_iter()
        .map(|(file, name, contents)| {
            let path = dir.path().join(name);
            std::fs::write(&path, contents).expect("Failed to write input file");
            (file, path)
        })
        .collect();

    InputFiles { dir, paths }
}
