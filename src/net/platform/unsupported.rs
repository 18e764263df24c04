//! Fallback for every other unix.

use super::{portable, Capability, Platform};
use crate::net::TcpOption;

/// Only the portable options work, the rest are no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Platform for Unsupported {
    const NAME: &'static str = "unsupported";

    fn capability(option: TcpOption) -> Capability {
        if portable(option) {
            Capability::Portable
        } else {
            Capability::Unsupported
        }
    }
}
