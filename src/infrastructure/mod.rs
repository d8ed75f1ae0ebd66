pub mod batch_store;
pub mod csv_export;

pub use batch_store::{save_records, BatchStore};
pub use csv_export::{render_csv, render_records, write_csv};
