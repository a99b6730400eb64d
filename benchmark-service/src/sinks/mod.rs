pub mod postgres;

pub use postgres::PostgresSubmissionSink;
