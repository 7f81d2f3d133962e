// Result-file loading, algorithm layout and descriptive statistics.
pub mod layout;
pub mod load;
pub mod record;
pub mod stats;
