//! Domain layer: the simulated payment record and the ports the simulator
//! depends on.

pub mod payment;
pub mod ports;
