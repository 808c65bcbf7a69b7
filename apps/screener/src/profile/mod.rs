// Candidate profile domain: date normalization, interval union, tenure stability,
// and the structured profile produced by extraction.
// Pure, synchronous, no I/O.

pub mod dates;
pub mod intervals;
pub mod models;
pub mod stability;
