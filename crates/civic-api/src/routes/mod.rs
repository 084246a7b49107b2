//! # Route Modules
//!
//! | Prefix                 | Module            |
//! |------------------------|-------------------|
//! | `/api/complaints/*`    | [`complaints`]    |
//! | `/api/notifications/*` | [`notifications`] |

pub mod complaints;
pub mod notifications;
