//! Writing tests - mutation, close and reopen.

mod lifecycle;
mod round_trip;
mod tables;
