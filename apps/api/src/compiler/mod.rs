// Template → schema compilation.
// Implements: schema graph assembly, execution plans with the generic
// decoder, and the plan cache keyed by (template id, version).
// Compilation is pure; the cache is the only shared mutable state.

pub mod cache;
pub mod plan;
pub mod schema;
