//! End-to-end tests: the manager API served over HTTP, talking to fake
//! agents over HTTP.


pub mod support;
