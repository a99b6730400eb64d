pub mod submission_csv_file;

pub use submission_csv_file::SubmissionCsvFileSource;
