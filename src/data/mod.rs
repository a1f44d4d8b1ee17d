//! Global data aggregation and front matter merging.
//!
//! Data files under a data root become one nested namespace, addressed by
//! their paths. Each document's front matter is merged with that namespace
//! under the reserved `globals` key.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      One document build                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  data/                                                               │
//! │  ├── site.yaml          KeyPath         FormatRegistry               │
//! │  └── team/              ────────►       ──────────────►  namespace   │
//! │      └── members.json   team.members    parse by ext     {site, team}│
//! │                                                              │       │
//! │  document.md                                                 ▼       │
//! │  ---                    front_matter::merge()  ─────►  { title,      │
//! │  title: Hi              (strip header)                   globals }   │
//! │  ---                           │                                     │
//! │  Body                          └──────────────────────►  "Body"      │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage in Templates
//!
//! ```text
//! {{ title }}                          front matter of this document
//! {{ globals.site.title }}             data/site.yaml → title
//! {% for m in globals.team.members %}  data/team/members.json
//! ```

pub mod error;
pub mod front_matter;
pub mod key_path;
pub mod loader;
pub mod namespace;
mod value;

pub use error::{DataError, FormatError, FrontMatterError};
pub use front_matter::{GLOBALS_KEY, Merged, merge};
pub use key_path::{DataFile, KeyPath};
pub use loader::{DataFormat, FormatRegistry};
pub use namespace::{CancelFlag, GlobalNamespace, NamespaceBuilder};
