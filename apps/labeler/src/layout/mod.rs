//! Label layout — paper profiles, field catalogs, text metrics, and the
//! adaptive engine that turns a label into a draw-op list.

pub mod catalog;
pub mod engine;
pub mod measure;
pub mod ops;
pub mod paper;
pub mod units;

pub use engine::{layout, LayoutOutput, LayoutRequest};
pub use ops::{DrawOp, ImageFit, PageSpec, TextAlign};
pub use paper::{PaperProfile, PaperSize, PolicyClass};
