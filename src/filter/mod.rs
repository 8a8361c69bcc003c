// ============================================================================
// FILTER MODULE — the uniform parameter interface over heterogeneous filters
// ============================================================================
//
// Architecture:
//   params.rs     — parameter tables, value types, ranges, clamping
//   descriptor.rs — FilterDescriptor: generic get/set/stash/restore/apply
//   library.rs    — the built-in filter definitions (one table, not N files)
// ============================================================================

pub mod descriptor;
pub mod library;
pub mod params;
