// Food Affordability Dashboard - Core Library
// Loaders, analytics and page rendering shared by the TUI and the web server

pub mod config;
pub mod error;
pub mod data;
pub mod selection;
pub mod analytics;
pub mod format;
pub mod annotations;    // Frozen caption audit
pub mod page;           // Renderer-neutral page model
pub mod views;
pub mod html;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use error::{LoadError, SelectionError};
pub use data::{AffordabilityRecord, Dataset, FoodPriceRecord, RawTable, parse_flexible_date};
pub use selection::{Granularity, Metric, Selection, View};
pub use annotations::{Annotation, AuditEntry, AuditOutcome};
pub use page::{Chart, ChartKind, Page, Series, Table, Widget, XValue};
pub use views::render;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
