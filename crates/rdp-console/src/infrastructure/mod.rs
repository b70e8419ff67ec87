//! Infrastructure layer: the RDP collaborator boundary, the per-session
//! connection lifecycle, and configuration persistence.

pub mod lifecycle;
pub mod rdp_bridge;
pub mod storage;
