// handlers/mod.rs - HTTP handlers
//
// system: service info and health (public)
// properties: listing reads (public) and owner-scoped writes (bearer token)

pub mod properties;
pub mod system;
