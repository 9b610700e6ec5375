//! Material manager tests: lookups, mutations, favorites and the debounced
//! rebuild.

pub mod tests_mutations;
