// Aggregates all former standalone integration tests as modules.
mod session_persistence;
