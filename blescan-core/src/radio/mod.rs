//! Radio adapter port
//!
//! The session manager drives discovery hardware only through
//! [`RadioAdapter`]. Drivers report results back through the [`RadioSink`]
//! handed to them on start; the sink may be used from any thread.

pub mod mock;
pub mod simulated;
mod sink;
pub mod traits;

pub use mock::{MockRadio, MockRadioHandle};
pub use simulated::{SimulatedRadio, SimulatorConfig};
pub use sink::{RadioEvent, RadioSink};
pub use traits::RadioAdapter;
