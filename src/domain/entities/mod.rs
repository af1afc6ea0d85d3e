pub mod signup;
pub mod webhook;
