//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements              | Connects to                 |
//! |------------|-------------------------|-----------------------------|
//! | `log_sink` | EventSink               | `log` facade                |
//! | `sim`      | AdcPort, ActuationSink  | Simulated test-stand plant  |
//! | `time`     | ClockPort, DelayNs      | `std::time` (host)          |

pub mod log_sink;
pub mod sim;
pub mod time;
