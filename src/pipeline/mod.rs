//! Pipeline stages for turning a hub model into a [`crate::ModelCardRecord`].
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! identifier ──▶ fetch ──▶ (markdown | html) ──▶ normalize ──▶ record
//!  (URL/id)      (HTTP)     (parse card)          (+ metrics, dates)
//! ```
//!
//! 1. [`identifier`]: canonicalise a page URL or bare id to `author/model`
//! 2. [`fetch`]: the only stage with network I/O (metadata API,
//!    README, rendered page and image resources)
//! 3. [`markdown`] / [`html`]: split card text into front matter and
//!    named sections
//! 4. [`metrics`]: pattern-driven numeric extraction
//! 5. [`dates`]: release date normalisation to `YYYY-MM-DD`
//! 6. [`normalize`]: assemble the record and collect degradations

pub mod dates;
pub mod fetch;
pub mod html;
pub mod identifier;
pub mod markdown;
pub mod metrics;
pub mod normalize;
