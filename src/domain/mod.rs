//! Domain layer: value types, the step-up policy and the ports the
//! orchestration core talks to.

pub mod outcome;
pub mod payment_method;
pub mod ports;
pub mod request;
pub mod state;
pub mod step_up;
