//! Integration tests with mock HTTP server

pub mod mock_server;
pub mod completion;
pub mod search;
pub mod routes;
