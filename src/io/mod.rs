/// CSV export of the SOC trace.
pub mod export;
/// CSV load-profile reader.
pub mod import;

pub use export::{export_soc_trace, write_soc_trace_csv};
pub use import::{parse_load_csv, read_load_csv};
