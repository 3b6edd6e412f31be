// starter-auth-core — shared types for the starter-auth workspace.
//
// Errors, logging, configuration, the account model, and the credential
// store trait that database backends implement.

pub mod error;
pub mod logger;
pub mod model;
pub mod options;
pub mod store;
