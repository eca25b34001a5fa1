// Path: crates/types/src/service_configs/mod.rs
//! On-chain service metadata.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// A bitmask of the capability interfaces a service exposes to other services.
    /// This is distinct from the service's callable methods, which are defined in its ABI.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[serde(transparent)]
    pub struct Capabilities: u32 {
        /// Implements `CallServiceReceiver`: the router may deliver cross-chain calls to it.
        const CALL_RECEIVER = 0b0001;
        /// Implements `CrossChainConnection`: the router may send messages through it.
        const CONNECTION = 0b0010;
    }
}

impl Encode for Capabilities {
    fn encode_to<T: parity_scale_codec::Output + ?Sized>(&self, dest: &mut T) {
        self.bits().encode_to(dest)
    }
}

impl Decode for Capabilities {
    fn decode<I: parity_scale_codec::Input>(
        input: &mut I,
    ) -> Result<Self, parity_scale_codec::Error> {
        let bits = u32::decode(input)?;
        Self::from_bits(bits).ok_or_else(|| "Invalid bits for Capabilities".into())
    }
}
