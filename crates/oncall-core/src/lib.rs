//! Core types: shifts, people, the cache line codec and tracing setup

pub mod codec;
pub mod person;
pub mod shift;
pub mod tracing;

pub use codec::{
    CodecError, NONE_SENTINEL, decode_person, decode_shift, encode_person, encode_shift,
};
pub use person::Person;
pub use shift::Shift;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
