pub mod builder;

pub use builder::{DEFAULT_LIMIT, QueryDescriptor, build_query, effective_limit, format_watermark};
