//! # Base Capability Contexts
//!
//! Context interfaces shared by every plugin of a family. CPU plugins
//! publish a `CpuContext` (directly, or through an extension trait that
//! names it as a supertrait) so devices can raise interrupts without knowing
//! which CPU they are wired to.

use crate::OwnerId;

crate::context_interface! {
    /// Interrupt and timing capabilities every CPU exposes to the plugins
    /// connected to it.
    pub trait CpuContext [cpu] {
        /// Whether the CPU accepts raw interrupt payloads.
        fn is_raw_interrupt_supported(&self) -> bool;

        /// Deliver a raw interrupt payload from `device`.
        ///
        /// Does nothing if raw interrupts are not supported.
        fn signal_raw_interrupt(&self, device: OwnerId, data: &[u8]);

        /// Whether the CPU accepts masked interrupts.
        fn is_interrupt_supported(&self) -> bool;

        /// Raise the interrupt lines in `mask` on behalf of `device`.
        fn signal_interrupt(&self, device: OwnerId, mask: u32);

        /// Withdraw a pending interrupt that was not handled yet.
        fn clear_interrupt(&self, device: OwnerId, mask: u32);

        /// Clock frequency in kHz, or 0 if unknown.
        fn frequency_khz(&self) -> u32;
    }
}
