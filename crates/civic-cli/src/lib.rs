//! # civic-cli: Operator CLI for the Civic Grievance Stack
//!
//! ## Subcommands
//!
//! - `civic classify`: Run intake triage on a title and description offline.
//! - `civic token`: Mint a bearer token for local development.
//! - `civic seed`: Print or write the demo directory seed YAML.
//!
//! ```bash
//! civic classify --title "Pothole" --description "huge pothole near school"
//! civic seed --output directory.yaml
//! JWT_SECRET=... civic token --user 00000000-0000-4000-8000-000000000003 --role official
//! ```

pub mod classify;
pub mod seed;
pub mod token;
