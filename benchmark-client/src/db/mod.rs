pub mod submission_queries;
