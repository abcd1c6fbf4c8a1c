pub mod dense;
pub mod pca;
pub mod statistics;
pub mod svd;
pub mod table;
mod utils;

pub use pca::{compute_pca, PCABuilder, Pca, PcaResult};
pub use table::{Record, Table, Value};
pub use utils::DataError;
