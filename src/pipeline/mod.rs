//! Pipeline stages for spreadsheet-to-payslip generation.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ columns ──▶ render ──▶ archive
//! (calamine)  (aliases)   (lopdf)    (zip, multi-row only)
//!                 │          ▲
//!                 ▼          │
//!              coerce ── words, logo, layout
//! ```
//!
//! 1. [`input`]  : open the workbook from memory and take the header row
//!    plus non-blank data rows of the selected sheet
//! 2. [`columns`]: fold headers to canonical names and check the required
//!    columns are present
//! 3. [`coerce`] : total conversions from loose cells to numbers, display
//!    strings and months
//! 4. [`render`] : compute the row's figures and lay out one A4 page; runs
//!    in `spawn_blocking` because PDF assembly is CPU-bound
//! 5. [`archive`]: deflate all documents into one zip
//!
//! Supporting modules: [`words`] (amount in words, Indian scale),
//! [`logo`] (decode and fit the company logo once per batch) and
//! [`layout`] (the lopdf drawing primitives).

pub mod archive;
pub mod coerce;
pub mod columns;
pub mod input;
pub mod layout;
pub mod logo;
pub mod render;
pub mod words;
