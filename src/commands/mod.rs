pub mod calibrate;
pub mod compare;
