//! Structures the text of a paginated restaurant menu into dish records.
//!
//! Fragments extracted from a PDF in reading order are grouped into
//! categories by heading heuristics, repaired by layout-specific resolvers
//! (some of which consult a remote text-generation service), and split into
//! name, price and description with a run-wide sequential identifier.

pub mod config;
pub mod disambiguate;
pub mod dish;
pub mod error;
pub mod extract;
pub mod group;
pub mod pipeline;
pub mod profile;
pub mod resolve;

pub use config::Settings;
pub use disambiguate::{Disambiguator, OpenAiDisambiguator, parse_item_list};
pub use dish::{DishIdCounter, DishRecord, UNKNOWN_PRICE, build_record};
pub use error::{ConfigError, DisambiguationError, PipelineError};
pub use group::{GroupedMenu, group};
pub use pipeline::{BatchReport, MenuPipeline};
pub use profile::{LayoutProfile, ResolverSpec, SplitTarget};
