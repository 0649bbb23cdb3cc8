//! Measurement decoders.
//!
//! Decoders are pure functions from frame bytes to an optional record. An
//! unknown mode byte is a normal occurrence and yields `None`; it never aborts
//! the pipeline. Field extraction is driven by the fixed layout tables in each
//! submodule, which mirror the vendors' wire formats byte for byte.

mod energy_meter;
mod multimeter;

pub use energy_meter::{
    AC_LAYOUT, DC_CHARGE_LAYOUT, MODE_OFFSET, USB_LAYOUT, decode_energy_meter, layout_for_mode,
};
pub use multimeter::{SERIAL_OFFSET, SerialInfo, decode_multimeter, unpack_serial};
