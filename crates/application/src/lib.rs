//! Application services and ports.

#![forbid(unsafe_code)]

mod permission_resolver;

pub use permission_resolver::{
    PermissionResolver, PermissionState, Resolution, ResourceContext,
};
