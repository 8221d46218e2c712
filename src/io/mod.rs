//! External collaborator boundary: delimited file input and the append-only
//! result sink.

pub mod csv;
